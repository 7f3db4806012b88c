//! In-memory HTML document tree for Prismatic.
//!
//! Pages produced by the static site generator are parsed into an arena-backed
//! [`Document`] that processors query and mutate, then serialized back to HTML:
//! - [`Document`]: parse, query by tag/class/predicate, mutate, serialize
//! - [`Page`]: shared handle around a document with change subscription
//! - [`PageChanges`]: debounced change notifications for observers
//!
//! # Example
//!
//! ```
//! use prismatic_dom::Document;
//!
//! let mut doc = Document::parse(r#"<pre><code data-lang="sh">ls</code></pre>"#).unwrap();
//! let code = doc.elements_by_tag(doc.root(), "code")[0];
//! doc.add_class(code, "language-bash");
//! assert_eq!(
//!     doc.to_html(),
//!     r#"<pre><code data-lang="sh" class="language-bash">ls</code></pre>"#
//! );
//! ```

mod document;
mod entities;
mod error;
mod page;
mod parser;
mod serializer;

pub use document::{Document, Element, NodeData, NodeId};
pub use error::DomError;
pub use page::{DEFAULT_DEBOUNCE, Page, PageChanges};
pub use parser::is_void_element;
pub use serializer::{escape_attr, escape_text};
