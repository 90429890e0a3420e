//! iamgraph Document Layer
//!
//! Turns the loosely formatted policy text found in IAM exports into
//! structured statements, and classifies each statement into the
//! resource × action grants it expresses.
//!
//! # Pipeline
//!
//! ```text
//! raw text → repair() → serde_json → PolicyDocument → Statement → Grant*
//! ```
//!
//! # Example
//!
//! ```rust
//! use iamgraph_document::{PolicyDocument, StatementShape};
//!
//! let doc = PolicyDocument::parse("[{'Resource': 's3:bucket', 'Action': ['s3:Get', 's3:Put']}]")?;
//! let grants = doc.grants();
//!
//! assert_eq!(grants.len(), 2);
//! assert!(grants.iter().all(|g| g.shape == StatementShape::ResourceAction));
//! # Ok::<(), iamgraph_document::DocumentError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod attachments;
pub mod document;
pub mod error;
pub mod repair;
pub mod statement;

pub use attachments::{AttachmentList, POLICY_NAME_KEY, USER_NAME_KEY};
pub use document::PolicyDocument;
pub use error::DocumentError;
pub use repair::{repair, Substitution, SUBSTITUTIONS};
pub use statement::{Axis, Grant, Polarity, Statement, StatementShape};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
