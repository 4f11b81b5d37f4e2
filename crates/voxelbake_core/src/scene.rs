//! Scene graph placement tree.
//!
//! ```text
//! nTRN 0 (root)
//! └── nGRP 1
//!     ├── nTRN 2  "_name"=model_0  [_t]
//!     │   └── nSHP 3  → model 0
//!     ├── nTRN 4  "_name"=model_1  [_t]
//!     │   └── nSHP 5  → model 1
//!     └── ...
//! ```
//!
//! Ids are assigned from the model index alone, so the graph for N models is
//! always the same shape. `_t` is only written for models that are not at
//! the origin.

use crate::partition::Model;

/// Id of the root transform node.
pub const ROOT_TRANSFORM_ID: u32 = 0;

/// Id of the root group node.
pub const ROOT_GROUP_ID: u32 = 1;

/// Frame key holding a translation.
pub const TRANSLATION_KEY: &str = "_t";

/// Node attribute key holding a display name.
pub const NAME_KEY: &str = "_name";

/// Id of the transform node placing model `index`.
#[inline]
#[must_use]
pub const fn model_transform_id(index: u32) -> u32 {
    2 + 2 * index
}

/// Id of the shape node referencing model `index`.
#[inline]
#[must_use]
pub const fn model_shape_id(index: u32) -> u32 {
    3 + 2 * index
}

/// Ordered string dictionary, as stored in node chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict {
    entries: Vec<(String, String)>,
}

impl Dict {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, replacing the value if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

/// One node of the placement tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneNode {
    /// `nTRN`: places its single child.
    Transform {
        /// Node id.
        id: u32,
        /// The node this transform places.
        child_id: u32,
        /// Frame translation; `None` writes no `_t` key.
        translation: Option<[i64; 3]>,
        /// Node attributes (`_name`).
        attributes: Dict,
    },
    /// `nGRP`: groups transforms.
    Group {
        /// Node id.
        id: u32,
        /// Children in order.
        child_ids: Vec<u32>,
    },
    /// `nSHP`: references one model.
    Shape {
        /// Node id.
        id: u32,
        /// Model index in SIZE/XYZI order.
        model_index: u32,
    },
}

impl SceneNode {
    /// The node's id.
    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Self::Transform { id, .. } | Self::Group { id, .. } | Self::Shape { id, .. } => *id,
        }
    }
}

/// Formats a translation as the `_t` frame value (`"x y z"`).
#[must_use]
pub fn format_translation(t: [i64; 3]) -> String {
    format!("{} {} {}", t[0], t[1], t[2])
}

/// Parses a `_t` frame value. `None` if it is not three integers.
#[must_use]
pub fn parse_translation(value: &str) -> Option<[i64; 3]> {
    let mut parts = value.split_whitespace().map(str::parse::<i64>);
    let t = [parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?];
    parts.next().is_none().then_some(t)
}

/// Builds the placement tree for `models` in model order.
#[must_use]
pub fn build_scene_graph(models: &[Model]) -> Vec<SceneNode> {
    let count = models.len() as u32;
    let mut nodes = Vec::with_capacity(2 + 2 * models.len());

    nodes.push(SceneNode::Transform {
        id: ROOT_TRANSFORM_ID,
        child_id: ROOT_GROUP_ID,
        translation: None,
        attributes: Dict::new(),
    });
    nodes.push(SceneNode::Group {
        id: ROOT_GROUP_ID,
        child_ids: (0..count).map(model_transform_id).collect(),
    });

    for (index, model) in (0..count).zip(models) {
        let translation = (!model.at_origin()).then(|| model.offset.map(i64::from));
        nodes.push(SceneNode::Transform {
            id: model_transform_id(index),
            child_id: model_shape_id(index),
            translation,
            attributes: [(NAME_KEY, format!("model_{index}"))].into_iter().collect(),
        });
        nodes.push(SceneNode::Shape {
            id: model_shape_id(index),
            model_index: index,
        });
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn model_at(offset: [u32; 3]) -> Model {
        Model {
            size: [1, 1, 1],
            voxels: Vec::new(),
            offset,
        }
    }

    #[test]
    fn test_single_model_graph() {
        let nodes = build_scene_graph(&[model_at([0, 0, 0])]);
        assert_eq!(nodes.len(), 4);
        assert_eq!(
            nodes[1],
            SceneNode::Group {
                id: 1,
                child_ids: vec![2]
            }
        );
        match &nodes[2] {
            SceneNode::Transform {
                id,
                child_id,
                translation,
                attributes,
            } => {
                assert_eq!((*id, *child_id), (2, 3));
                assert_eq!(*translation, None);
                assert_eq!(attributes.get(NAME_KEY), Some("model_0"));
            }
            other => panic!("expected transform, got {other:?}"),
        }
        assert_eq!(nodes[3], SceneNode::Shape { id: 3, model_index: 0 });
    }

    #[test]
    fn test_ids_unique_and_shapes_in_order() {
        let models: Vec<Model> = (0..5).map(|i| model_at([i * 256, 0, 0])).collect();
        let nodes = build_scene_graph(&models);

        let ids: HashSet<u32> = nodes.iter().map(SceneNode::id).collect();
        assert_eq!(ids.len(), nodes.len());

        let shapes: Vec<u32> = nodes
            .iter()
            .filter_map(|n| match n {
                SceneNode::Shape { model_index, .. } => Some(*model_index),
                _ => None,
            })
            .collect();
        assert_eq!(shapes, vec![0, 1, 2, 3, 4]);

        match &nodes[6] {
            SceneNode::Transform { translation, .. } => assert_eq!(*translation, Some([512, 0, 0])),
            other => panic!("expected transform, got {other:?}"),
        }
    }

    #[test]
    fn test_translation_text() {
        assert_eq!(format_translation([256, 0, -12]), "256 0 -12");
        assert_eq!(parse_translation("256 0 -12"), Some([256, 0, -12]));
        assert_eq!(parse_translation("1 2"), None);
        assert_eq!(parse_translation("1 2 3 4"), None);
        assert_eq!(parse_translation("a b c"), None);
    }

    #[test]
    fn test_dict_insert_replaces() {
        let mut dict = Dict::new();
        dict.insert("_t", "1 2 3");
        dict.insert("_name", "a");
        dict.insert("_t", "4 5 6");
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get("_t"), Some("4 5 6"));
        assert_eq!(dict.iter().next(), Some(("_t", "4 5 6")));
    }
}
