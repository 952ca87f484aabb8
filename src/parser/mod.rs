//! Lock-tree ingest for lockscope.
//!
//! Parses `npm ls --all --json` output into the normalized tuple sequence
//! consumed by the graph builder.
//!
//! # Example
//!
//! ```
//! use lockscope::parser::parse_str;
//!
//! let json = r#"{
//!     "name": "my-app",
//!     "version": "1.0.0",
//!     "dependencies": {
//!         "react": { "version": "18.2.0" }
//!     }
//! }"#;
//!
//! let tree = parse_str(json).unwrap();
//! assert_eq!(tree.root.unwrap().name, "my-app");
//! assert_eq!(tree.tuples.len(), 1);
//! ```

pub mod npm_tree;
pub mod types;

// Re-export commonly used items for convenience
pub use npm_tree::{parse_file, parse_str, IngestError, IngestResult};
pub use types::{DependencyTuple, NormalizedTree, NpmTree, PackageRef};
