use crate::{
    error::Error,
    types::{Binding, Definition, Element, Message, NamespacedName, PortType, Type},
};

/// Every description loaded for one run, in load order.
///
/// Several descriptions may share a target namespace; qualified lookups walk
/// all of them in load order, so a name missing from the first falls back to
/// its same-namespace siblings.
#[derive(Default, Debug, Clone)]
pub struct Descriptions {
    items: Vec<Definition>,
}

impl Descriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, definition: Definition) -> usize {
        self.items.push(definition);
        self.items.len() - 1
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Definition> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Definition> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.items.iter()
    }

    pub fn by_namespace<'a, 'n>(
        &'a self,
        namespace: &'n str,
    ) -> impl Iterator<Item = &'a Definition> + 'n
    where
        'a: 'n,
    {
        self.items
            .iter()
            .filter(move |definition| definition.target_namespace == namespace)
    }

    pub fn find_by_namespace_mut(&mut self, namespace: &str) -> Option<&mut Definition> {
        self.items
            .iter_mut()
            .find(|definition| definition.target_namespace == namespace)
    }

    pub fn find_message(&self, name: &NamespacedName) -> Option<&Message> {
        self.by_namespace(&name.namespace)
            .find_map(|definition| definition.find_message(&name.name))
    }

    pub fn find_port_type(&self, name: &NamespacedName) -> Option<&PortType> {
        self.by_namespace(&name.namespace)
            .find_map(|definition| definition.find_port_type(&name.name))
    }

    pub fn find_binding(&self, name: &NamespacedName) -> Option<&Binding> {
        self.by_namespace(&name.namespace)
            .find_map(|definition| definition.find_binding(&name.name))
    }

    /// The binding together with the description that declares it.
    pub fn find_binding_with_definition(
        &self,
        name: &NamespacedName,
    ) -> Option<(&Definition, &Binding)> {
        self.by_namespace(&name.namespace).find_map(|definition| {
            definition
                .find_binding(&name.name)
                .map(|binding| (definition, binding))
        })
    }

    pub fn find_element(&self, name: &NamespacedName) -> Option<&Element> {
        self.items
            .iter()
            .find_map(|definition| definition.types.find_element(name))
    }

    pub fn find_type(&self, name: &NamespacedName) -> Option<&Type> {
        self.items
            .iter()
            .find_map(|definition| definition.types.find_type(name))
    }

    pub fn message(&self, name: &NamespacedName) -> Result<&Message, Error> {
        self.find_message(name).ok_or_else(|| Error::Unresolved {
            kind: "message",
            name: name.clone(),
        })
    }

    pub fn port_type(&self, name: &NamespacedName) -> Result<&PortType, Error> {
        self.find_port_type(name).ok_or_else(|| Error::Unresolved {
            kind: "portType",
            name: name.clone(),
        })
    }

    pub fn binding(&self, name: &NamespacedName) -> Result<&Binding, Error> {
        self.find_binding(name).ok_or_else(|| Error::Unresolved {
            kind: "binding",
            name: name.clone(),
        })
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&Definition, &Binding)> {
        self.items.iter().flat_map(|definition| {
            definition
                .bindings
                .iter()
                .map(move |binding| (definition, binding))
        })
    }

    pub fn reset_handled(&self) {
        for definition in &self.items {
            definition.reset_handled();
        }
    }
}

impl From<Definition> for Descriptions {
    fn from(definition: Definition) -> Self {
        Self {
            items: vec![definition],
        }
    }
}

impl FromIterator<Definition> for Descriptions {
    fn from_iter<I: IntoIterator<Item = Definition>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
