//! Host element construction.

use crate::dom::{ElementData, Namespace};
use std::sync::Arc;

/// Element construction failure. The tree builder falls back to default
/// construction and never surfaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryError {
    message: String,
}

impl FactoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FactoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element factory failed: {}", self.message)
    }
}

impl std::error::Error for FactoryError {}

/// Lets a host substitute its own element payload (for instance, tagging
/// elements with a host-specific kind).
pub trait ElementFactory {
    fn create_element(
        &mut self,
        ns: Namespace,
        name: &str,
        attributes: &[(Arc<str>, Option<String>)],
    ) -> Result<ElementData, FactoryError>;
}

/// Build element data through `factory`, falling back to the plain payload.
///
/// Factory output whose namespace or name disagrees with the token is
/// rejected, since tree construction keys off both.
pub(crate) fn build_element(
    factory: Option<&mut (dyn ElementFactory + '_)>,
    ns: Namespace,
    name: Arc<str>,
    attributes: Vec<(Arc<str>, Option<String>)>,
) -> ElementData {
    if let Some(factory) = factory {
        match factory.create_element(ns, &name, &attributes) {
            Ok(element) if element.ns == ns && element.name == name => return element,
            Ok(element) => log::debug!(
                target: "html5.tree_builder",
                "factory returned {:?}:{} for {:?}:{}; using default element",
                element.ns,
                element.name,
                ns,
                name
            ),
            Err(err) => log::debug!(
                target: "html5.tree_builder",
                "{err}; using default element for {name}"
            ),
        }
    }
    ElementData::new(ns, name, attributes)
}
