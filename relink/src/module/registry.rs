// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Binding registry
//!
//! Each module owns one registry mapping its exported names to bindings.
//! Local exports are accessors over the module's own slots, so a read always
//! observes the slot's current value. Re-exports point into other registries
//! and are followed at read time, never copied.

use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashMap;
use tracing::trace;

use super::{ModuleId, value::Value};
use crate::error::BindingError;

pub type Accessor = Rc<dyn Fn() -> Value>;

#[derive(Clone)]
enum Binding {
    /// Reads the current value of a slot.
    Live(Accessor),
    /// A value handed over by the host before the registry existed. Replaced
    /// with a live accessor by [`BindingRegistry::upgrade`].
    Plain(Value),
    /// `export { name as exported } from "source"`
    Indirect {
        registry: BindingRegistry,
        name: String,
    },
    /// `export * as exported from "source"`
    Namespace(BindingRegistry),
}

struct RegistryData {
    module: ModuleId,
    bindings: AHashMap<String, Binding>,
    /// Installation order of `bindings`.
    order: Vec<String>,
    /// `export * from` sources, consulted after own bindings.
    stars: Vec<BindingRegistry>,
}

enum Lookup {
    Found(Value),
    NotFound,
    Cycle,
}

/// Shared handle to a module's binding registry.
#[derive(Clone)]
pub struct BindingRegistry(Rc<RefCell<RegistryData>>);

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("BindingRegistry")
            .field("module", &data.module)
            .field("names", &data.order)
            .field("stars", &data.stars.len())
            .finish()
    }
}

impl BindingRegistry {
    pub fn new(module: ModuleId) -> Self {
        Self(Rc::new(RefCell::new(RegistryData {
            module,
            bindings: AHashMap::default(),
            order: Vec::new(),
            stars: Vec::new(),
        })))
    }

    pub fn module(&self) -> ModuleId {
        self.0.borrow().module.clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn insert(&self, name: &str, binding: Binding) -> Result<(), BindingError> {
        let mut data = self.0.borrow_mut();
        if data.bindings.contains_key(name) {
            return Err(BindingError::AlreadyInstalled {
                name: name.to_owned(),
            });
        }
        data.bindings.insert(name.to_owned(), binding);
        data.order.push(name.to_owned());
        Ok(())
    }

    /// Registers a live read function for `name`.
    pub fn install(&self, name: &str, accessor: Accessor) -> Result<(), BindingError> {
        self.insert(name, Binding::Live(accessor))
    }

    /// Registers a fixed value for `name`.
    pub fn install_plain(&self, name: &str, value: Value) -> Result<(), BindingError> {
        self.insert(name, Binding::Plain(value))
    }

    /// Makes `name` read through to `target` in `registry`.
    pub fn install_indirect(
        &self,
        name: &str,
        registry: &BindingRegistry,
        target: &str,
    ) -> Result<(), BindingError> {
        self.insert(
            name,
            Binding::Indirect {
                registry: registry.clone(),
                name: target.to_owned(),
            },
        )
    }

    /// Makes `name` read as the namespace of `registry`.
    pub fn install_namespace(
        &self,
        name: &str,
        registry: &BindingRegistry,
    ) -> Result<(), BindingError> {
        self.insert(name, Binding::Namespace(registry.clone()))
    }

    pub fn add_star_source(&self, registry: &BindingRegistry) {
        let mut data = self.0.borrow_mut();
        if !data.stars.iter().any(|star| star.ptr_eq(registry)) {
            data.stars.push(registry.clone());
        }
    }

    /// Replaces the binding installed for `name` with a live accessor. The
    /// name stays installed; only how it is read changes.
    pub fn upgrade(&self, name: &str, accessor: Accessor) -> Result<(), BindingError> {
        let mut data = self.0.borrow_mut();
        let Some(binding) = data.bindings.get_mut(name) else {
            return Err(BindingError::Missing {
                name: name.to_owned(),
            });
        };
        *binding = Binding::Live(accessor);
        Ok(())
    }

    /// Returns true if `name` is installed on this registry itself.
    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Returns true if `name` is read through a live accessor or through
    /// another registry.
    pub fn is_live(&self, name: &str) -> bool {
        matches!(
            self.0.borrow().bindings.get(name),
            Some(Binding::Live(_) | Binding::Indirect { .. } | Binding::Namespace(_))
        )
    }

    /// Returns true if reading `name` would find a binding, either installed
    /// here or provided by a star source.
    pub fn provides(&self, name: &str) -> bool {
        self.provides_inner(name, &mut Vec::new())
    }

    fn provides_inner(&self, name: &str, visited: &mut Vec<BindingRegistry>) -> bool {
        if visited.iter().any(|registry| registry.ptr_eq(self)) {
            return false;
        }
        visited.push(self.clone());
        let data = self.0.borrow();
        if data.bindings.contains_key(name) {
            return true;
        }
        name != "default"
            && data
                .stars
                .iter()
                .any(|star| star.provides_inner(name, visited))
    }

    /// Reads the current value of `name`.
    pub fn read(&self, name: &str) -> Result<Value, BindingError> {
        trace!(module = %self.module(), name, "registry read");
        match self.lookup(name, &mut Vec::new())? {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(BindingError::Missing {
                name: name.to_owned(),
            }),
            Lookup::Cycle => Err(BindingError::Circular {
                name: name.to_owned(),
            }),
        }
    }

    fn lookup(
        &self,
        name: &str,
        resolve_set: &mut Vec<(BindingRegistry, String)>,
    ) -> Result<Lookup, BindingError> {
        // 1. If this module and name were already visited on the current
        //    path, the resolution is circular.
        if resolve_set
            .iter()
            .any(|(registry, visited)| registry.ptr_eq(self) && visited == name)
        {
            return Ok(Lookup::Cycle);
        }
        resolve_set.push((self.clone(), name.to_owned()));
        // 2. Clone the binding out so accessors run without the registry
        //    borrowed; they may read this registry again.
        let (binding, stars) = {
            let data = self.0.borrow();
            (data.bindings.get(name).cloned(), data.stars.clone())
        };
        let result = match binding {
            Some(Binding::Live(accessor)) => Ok(Lookup::Found(accessor())),
            Some(Binding::Plain(value)) => Ok(Lookup::Found(value)),
            Some(Binding::Namespace(registry)) => Ok(Lookup::Found(Value::Namespace(registry))),
            Some(Binding::Indirect {
                registry,
                name: target,
            }) => match registry.lookup(&target, resolve_set)? {
                Lookup::Found(value) => Ok(Lookup::Found(value)),
                Lookup::NotFound => Err(BindingError::Missing { name: target }),
                Lookup::Cycle => Err(BindingError::Circular {
                    name: name.to_owned(),
                }),
            },
            // 3. `default` is never provided by `export *`.
            None if name == "default" => Ok(Lookup::NotFound),
            None => {
                let mut result = Ok(Lookup::NotFound);
                for star in stars {
                    match star.lookup(name, resolve_set)? {
                        Lookup::Found(value) => {
                            result = Ok(Lookup::Found(value));
                            break;
                        }
                        Lookup::NotFound | Lookup::Cycle => {}
                    }
                }
                result
            }
        };
        resolve_set.pop();
        result
    }

    /// Every readable name: own bindings in installation order, then names
    /// provided by star sources.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names, &mut Vec::new(), true);
        names
    }

    fn collect_names(
        &self,
        names: &mut Vec<String>,
        visited: &mut Vec<BindingRegistry>,
        include_default: bool,
    ) {
        if visited.iter().any(|registry| registry.ptr_eq(self)) {
            return;
        }
        visited.push(self.clone());
        let stars = {
            let data = self.0.borrow();
            for name in &data.order {
                if (include_default || name != "default") && !names.contains(name) {
                    names.push(name.clone());
                }
            }
            data.stars.clone()
        };
        for star in stars {
            star.collect_names(names, visited, false);
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;

    fn registry(name: &str) -> BindingRegistry {
        BindingRegistry::new(ModuleId::from(name))
    }

    #[test]
    fn read_reflects_current_slot_value() {
        let slot = Rc::new(Cell::new(1.0));
        let registry = registry("counter");
        let reader = slot.clone();
        registry
            .install("count", Rc::new(move || Value::from(reader.get())))
            .unwrap();
        assert_eq!(registry.read("count").unwrap(), Value::from(1));
        slot.set(5.0);
        assert_eq!(registry.read("count").unwrap(), Value::from(5));
    }

    #[test]
    fn missing_names_fail() {
        let registry = registry("empty");
        assert_eq!(
            registry.read("nope"),
            Err(BindingError::Missing {
                name: "nope".into()
            })
        );
    }

    #[test]
    fn installing_twice_fails() {
        let registry = registry("twice");
        registry.install_plain("a", Value::Null).unwrap();
        assert!(matches!(
            registry.install_plain("a", Value::Null),
            Err(BindingError::AlreadyInstalled { .. })
        ));
    }

    #[test]
    fn upgrade_replaces_plain_value() {
        let registry = registry("host");
        registry.install_plain("version", Value::from(1)).unwrap();
        assert!(!registry.is_live("version"));
        registry
            .upgrade("version", Rc::new(|| Value::from(2)))
            .unwrap();
        assert!(registry.is_live("version"));
        assert_eq!(registry.read("version").unwrap(), Value::from(2));
        assert!(registry.upgrade("other", Rc::new(|| Value::Null)).is_err());
    }

    #[test]
    fn indirect_and_star_bindings_follow_source() {
        let source = registry("source");
        let slot = Rc::new(Cell::new(0.0));
        let reader = slot.clone();
        source
            .install("value", Rc::new(move || Value::from(reader.get())))
            .unwrap();
        source.install_plain("default", Value::from("d")).unwrap();

        let reexporter = registry("reexporter");
        reexporter
            .install_indirect("renamed", &source, "value")
            .unwrap();
        reexporter.add_star_source(&source);

        slot.set(3.0);
        assert_eq!(reexporter.read("renamed").unwrap(), Value::from(3));
        assert_eq!(reexporter.read("value").unwrap(), Value::from(3));
        assert!(reexporter.read("default").is_err());
        assert_eq!(reexporter.names(), vec!["renamed", "value"]);
    }

    #[test]
    fn circular_indirect_bindings_are_detected() {
        let a = registry("a");
        let b = registry("b");
        a.install_indirect("x", &b, "y").unwrap();
        b.install_indirect("y", &a, "x").unwrap();
        assert!(matches!(a.read("x"), Err(BindingError::Circular { .. })));

        a.add_star_source(&b);
        b.add_star_source(&a);
        assert!(matches!(a.read("z"), Err(BindingError::Missing { .. })));
        assert!(!a.provides("z"));
    }
}
