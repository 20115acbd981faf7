use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::response::graphql_error::GraphQLErrorPathSegment;
use crate::schema::types::TypeRef;

pub(crate) type NodeId = usize;

pub(crate) const ROOT: NodeId = 0;

#[derive(Debug)]
pub(crate) enum NodeKind {
    Root(IndexMap<String, NodeId>),
    /// Waiting for its resolver.
    Pending,
    /// Children keyed by response name, in document order.
    Object(IndexMap<String, NodeId>),
    Array(Vec<NodeId>),
    Leaf(Value),
    Null,
}

#[derive(Debug)]
pub(crate) struct ExecutionNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Type of the position the node fills. `None` for the root.
    pub ty: Option<TypeRef>,
    pub path: Vec<GraphQLErrorPathSegment>,
}

/// The result of an execution, built node by node while resolvers complete.
///
/// Nodes live in a flat arena and point at their parent by index, so a null can be propagated
/// upwards without any shared ownership.
#[derive(Debug)]
pub(crate) struct ExecutionTree {
    nodes: Vec<ExecutionNode>,
    data_is_null: bool,
}

impl ExecutionTree {
    pub fn new() -> Self {
        ExecutionTree {
            nodes: vec![ExecutionNode {
                kind: NodeKind::Root(IndexMap::new()),
                parent: None,
                ty: None,
                path: Vec::new(),
            }],
            data_is_null: false,
        }
    }

    pub fn path(&self, id: NodeId) -> &[GraphQLErrorPathSegment] {
        &self.nodes[id].path
    }

    pub fn set(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id].kind = kind;
    }

    /// Turns `parent` into an empty object, ready for [`ExecutionTree::add_field`].
    pub fn make_object(&mut self, parent: NodeId) {
        if !matches!(self.nodes[parent].kind, NodeKind::Root(_)) {
            self.set(parent, NodeKind::Object(IndexMap::new()));
        }
    }

    /// Adds a pending field under an object (or the root).
    pub fn add_field(&mut self, parent: NodeId, response_name: &str, ty: TypeRef) -> NodeId {
        let id = self.push(
            parent,
            GraphQLErrorPathSegment::String(response_name.to_string()),
            ty,
        );
        match &mut self.nodes[parent].kind {
            NodeKind::Root(children) | NodeKind::Object(children) => {
                children.insert(response_name.to_string(), id);
            }
            _ => {}
        }
        id
    }

    /// Turns `parent` into an array of `len` pending items of type `item_type`.
    pub fn add_items(&mut self, parent: NodeId, item_type: &TypeRef, len: usize) -> Vec<NodeId> {
        let items: Vec<NodeId> = (0..len)
            .map(|index| self.push(parent, GraphQLErrorPathSegment::Index(index), item_type.clone()))
            .collect();
        self.set(parent, NodeKind::Array(items.clone()));
        items
    }

    fn push(&mut self, parent: NodeId, segment: GraphQLErrorPathSegment, ty: TypeRef) -> NodeId {
        let mut path = self.nodes[parent].path.clone();
        path.push(segment);
        self.nodes.push(ExecutionNode {
            kind: NodeKind::Pending,
            parent: Some(parent),
            ty: Some(ty),
            path,
        });
        self.nodes.len() - 1
    }

    /// Whether the node, or any of its ancestors, was replaced by a null.
    pub fn is_discarded(&self, id: NodeId) -> bool {
        if self.data_is_null {
            return true;
        }

        let mut current = Some(id);
        while let Some(id) = current {
            let node = &self.nodes[id];
            if matches!(node.kind, NodeKind::Null) {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Nulls the nearest nullable position at or above `id`. When every position up to the root
    /// is non-null, the whole `data` becomes null.
    pub fn propagate_null(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &mut self.nodes[id];
            match &node.ty {
                Some(ty) if !ty.is_non_null() => {
                    node.kind = NodeKind::Null;
                    return;
                }
                Some(_) => current = node.parent,
                None => break,
            }
        }
        self.data_is_null = true;
    }

    pub fn data_is_null(&self) -> bool {
        self.data_is_null
    }

    pub fn into_data(self) -> Value {
        if self.data_is_null {
            return Value::Null;
        }
        self.render(ROOT)
    }

    fn render(&self, id: NodeId) -> Value {
        match &self.nodes[id].kind {
            NodeKind::Root(children) | NodeKind::Object(children) => {
                let mut object = Map::with_capacity(children.len());
                for (response_name, child) in children {
                    object.insert(response_name.clone(), self.render(*child));
                }
                Value::Object(object)
            }
            NodeKind::Array(items) => {
                Value::Array(items.iter().map(|item| self.render(*item)).collect())
            }
            NodeKind::Leaf(value) => value.clone(),
            NodeKind::Pending | NodeKind::Null => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ExecutionTree, NodeKind, ROOT};
    use crate::schema::types::TypeRef;

    #[test]
    fn renders_in_insertion_order() {
        let mut tree = ExecutionTree::new();
        let b = tree.add_field(ROOT, "b", TypeRef::named("Int"));
        let a = tree.add_field(ROOT, "a", TypeRef::named_list("Int"));
        let items = tree.add_items(a, &TypeRef::named("Int"), 2);
        tree.set(items[1], NodeKind::Leaf(json!(2)));
        tree.set(items[0], NodeKind::Leaf(json!(1)));
        tree.set(b, NodeKind::Leaf(json!(0)));

        assert_eq!(tree.path(items[1]).len(), 2);
        assert_eq!(tree.into_data().to_string(), r#"{"b":0,"a":[1,2]}"#);
    }

    #[test]
    fn null_stops_at_the_nearest_nullable_position() {
        let mut tree = ExecutionTree::new();
        let user = tree.add_field(ROOT, "user", TypeRef::named("User"));
        tree.make_object(user);
        let friends = tree.add_field(user, "friends", TypeRef::named_nn("User").list().non_null());
        let items = tree.add_items(friends, &TypeRef::named_nn("User"), 1);
        tree.make_object(items[0]);
        let name = tree.add_field(items[0], "name", TypeRef::named_nn("String"));

        tree.propagate_null(name);
        assert!(tree.is_discarded(name));
        assert!(!tree.data_is_null());
        assert_eq!(tree.into_data(), json!({ "user": null }));
    }

    #[test]
    fn null_reaching_the_root_nulls_data() {
        let mut tree = ExecutionTree::new();
        let a = tree.add_field(ROOT, "a", TypeRef::named_nn("A"));
        tree.make_object(a);
        let b = tree.add_field(a, "b", TypeRef::named_nn("String"));

        tree.propagate_null(b);
        assert!(tree.data_is_null());
        assert_eq!(tree.into_data(), json!(null));
    }
}
