use fxhash::FxHashMap;

use crate::netlist::module::Module;

/// A collection of modules, kept in declaration order
#[derive(Debug, Clone, Default)]
pub struct Design {
    modules: Vec<Module>,
    index: FxHashMap<String, usize>,
}

impl Design {
    /// Create a new empty design
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of modules
    pub fn nb_modules(&self) -> usize {
        self.modules.len()
    }

    /// Returns whether a module with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Add a module; its name must be unique in the design
    pub fn add_module(&mut self, module: Module) -> &mut Module {
        let i = self.modules.len();
        let present = self.index.insert(module.name().to_owned(), i).is_some();
        assert!(!present, "Module {} is defined twice", module.name());
        self.modules.push(module);
        &mut self.modules[i]
    }

    /// Add a module, replacing a module of the same name if there is one
    ///
    /// Returns the new module, and whether an existing one was replaced.
    pub fn replace_module(&mut self, module: Module) -> (&mut Module, bool) {
        let existing = self.index.get(module.name()).copied();
        match existing {
            Some(i) => {
                self.modules[i] = module;
                (&mut self.modules[i], true)
            }
            None => (self.add_module(module), false),
        }
    }

    /// Look up a module by name
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.index.get(name).map(|i| &self.modules[*i])
    }

    /// Iterate over the modules in declaration order
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Iterate over the modules in declaration order, for modification
    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> {
        self.modules.iter_mut()
    }
}

/// A store of named designs, owned by the caller and passed around explicitly
///
/// This replaces a process-wide table of saved designs: the library design is
/// looked up here by name, and the generated rules accumulate in a reserved entry.
#[derive(Debug, Default)]
pub struct DesignRegistry {
    designs: FxHashMap<String, Design>,
}

impl DesignRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a design under a name; returns the design previously stored there
    pub fn insert(&mut self, name: &str, design: Design) -> Option<Design> {
        self.designs.insert(name.to_owned(), design)
    }

    /// Look up a design by name
    pub fn get(&self, name: &str) -> Option<&Design> {
        self.designs.get(name)
    }

    /// Look up a design by name, creating an empty one if missing
    pub fn get_or_create(&mut self, name: &str) -> &mut Design {
        self.designs.entry(name.to_owned()).or_default()
    }

    /// Remove a design from the registry
    pub fn remove(&mut self, name: &str) -> Option<Design> {
        self.designs.remove(name)
    }
}
