//! Module type to rule handler dispatch

use super::rules::{
    CcBinaryHandler, CcLibraryHandler, CcLibrarySharedHandler, CcLibraryStaticHandler, FilegroupHandler,
    GenericRuleHandler, GenruleHandler, RuleHandler,
};
use crate::config::Bp2BuildConfig;
use crate::graph::Module;

/// Rule handlers, consulted in registration order
pub struct RuleRegistry {
    handlers: Vec<Box<dyn RuleHandler>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Schema-driven handlers from the config first, so a schema can take
    /// over a built-in module type, then the built-in handlers
    pub fn with_builtin_rules(config: &Bp2BuildConfig) -> Self {
        let mut registry = Self::new();
        for (module_type, schema) in &config.rules {
            registry.register(Box::new(GenericRuleHandler::new(module_type, schema.clone())));
        }
        registry.register(Box::new(FilegroupHandler));
        registry.register(Box::new(GenruleHandler));
        registry.register(Box::new(CcLibraryStaticHandler));
        registry.register(Box::new(CcLibrarySharedHandler));
        registry.register(Box::new(CcLibraryHandler));
        registry.register(Box::new(CcBinaryHandler));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn RuleHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_for(&self, module_type: &str) -> Option<&dyn RuleHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(module_type))
            .map(|handler| handler.as_ref())
    }

    /// Target name for `module` (or one of its variants) as its handler
    /// names it; unhandled types use the module name
    pub fn target_name(&self, module: &Module, variant: Option<&str>) -> String {
        match self.handler_for(&module.module_type) {
            Some(handler) => handler.target_name(module, variant),
            None => module.name.clone(),
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
