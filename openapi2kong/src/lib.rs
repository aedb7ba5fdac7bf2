//! OpenAPI 3 to Kong Gateway declarative configuration conversion.
//!
//! # Architecture
//!
//! - [`openapi`] — Read-only view over the parsed document: servers, paths,
//!   operations in canonical method order, merged parameters, local `$ref`
//!   resolution and `x-kong-*` extensions
//! - [`entity`] — Builders for Kong services, upstreams, routes and plugins,
//!   including the derived `request-validator` plugin
//! - [`convert`] — Orchestrates the builders over a whole document and
//!   assembles the declarative configuration
//! - [`options`] — Per-run settings, loadable from TOML
//! - [`summary`] — Entity counts for reporting
//!
//! # Extensions
//!
//! | Extension                         | Levels                    | Effect                                   |
//! |-----------------------------------|---------------------------|------------------------------------------|
//! | `x-kong-name`                     | document, path, operation | entity naming                            |
//! | `x-kong-service-defaults`         | document, path, operation | service fields; nested levels get their own service |
//! | `x-kong-upstream-defaults`        | document, path, operation | upstream fields                          |
//! | `x-kong-route-defaults`           | document, path, operation | route fields, nearest level wins         |
//! | `x-kong-plugin-<name>`            | document, path, operation | plugin on services (document) or routes  |
//! | `x-kong-plugin-request-validator` | document, path, operation | request validator config overrides       |
//!
//! # Examples
//!
//! ```ignore
//! use openapi2kong::{convert, ConversionOptions};
//! use yaml_tree_core::{write, Format};
//!
//! let options = ConversionOptions::default().with_tags(["OAS3_import"]);
//! let config = convert(&std::fs::read("petstore.yaml")?, &options)?;
//! println!("{}", String::from_utf8(write(&config, Format::Yaml)?)?);
//! ```
//!
//! # Built on yaml-tree-core
//!
//! Input parsing, output encoding and every edit of the generated entities go
//! through `yaml-tree-core`, which keeps field order stable from input to
//! output.

pub mod convert;
pub mod entity;
pub mod error;
pub mod openapi;
pub mod options;
pub mod summary;

pub use convert::{convert, convert_tree, FORMAT_VERSION};
pub use error::ConvertError;
pub use options::{load_options, ConversionOptions, OptionsLoadError};
