//! String-backed entity identifiers.
//!
//! Every entity in a scene snapshot is addressed by an opaque string id. Each kind gets its own
//! newtype so a layer id can never be passed where a property id is expected.

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a composition.
    CompositionId
);
string_id!(
    /// Identifier of a layer.
    LayerId
);
string_id!(
    /// Identifier of a property, compound property or property group.
    PropertyId
);
string_id!(
    /// Identifier of a keyframe timeline.
    TimelineId
);
string_id!(
    /// Identifier of a keyframe.
    KeyframeId
);
string_id!(
    /// Identifier of a flow (node) graph.
    FlowGraphId
);
string_id!(
    /// Identifier of a flow graph node.
    FlowNodeId
);
