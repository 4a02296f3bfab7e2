use serde::{Deserialize, Serialize};

/// Construction record for a node. Display metadata rides along for the renderer; only the
/// size takes part in layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// `parents` accepts either a single id or a list of ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parents {
    One(String),
    Many(Vec<String>),
}

impl Parents {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Parents::One(p) => std::slice::from_ref(p),
            Parents::Many(ps) => ps.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub child: String,
    pub parents: Parents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSpec {
    #[serde(rename = "nodeA")]
    pub node_a: String,
    #[serde(rename = "nodeB")]
    pub node_b: String,
}

/// A whole graph description, as read by [`crate::Graph::from_spec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default)]
    pub relations: Vec<RelationSpec>,
}

impl GraphSpec {
    pub fn node(mut self, id: impl Into<String>) -> Self {
        self.nodes.push(NodeSpec::new(id));
        self
    }

    pub fn depends_on<I, S>(mut self, child: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.push(DependencySpec {
            child: child.into(),
            parents: Parents::Many(parents.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn related(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.relations.push(RelationSpec {
            node_a: a.into(),
            node_b: b.into(),
        });
        self
    }
}
