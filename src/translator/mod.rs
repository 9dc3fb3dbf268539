//! Operation → statement translation.
//!
//! [`Translator::translate`] resolves the root field against the schema,
//! checks that the operation is enabled and dispatches to the read, connection,
//! aggregate or mutation translator. All state lives in a fresh
//! [`TranslationContext`]; the schema is only borrowed, so one schema can serve
//! any number of concurrent translations.

pub mod aggregate;
pub mod cardinality;
pub mod computed;
pub mod context;
pub mod create;
pub mod delete;
pub mod errors;
pub mod mutation_plan;
pub mod operation;
pub mod patterns;
pub mod phases;
pub mod projection;
pub mod read;
pub mod update;

use crate::auth::AuthContext;
use crate::cypher::CypherStatement;
use crate::graph_catalog::{GraphSchema, MutationKind, RootField};
use crate::pagination::root_connection;

pub use context::TranslationContext;
pub use errors::{ErrorKind, TranslateError};
pub use operation::{FieldSelection, Operation, OperationKind};

/// Selection depth accepted when none is configured.
pub const DEFAULT_MAX_SELECTION_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct Translator<'s> {
    schema: &'s GraphSchema,
    max_selection_depth: usize,
}

impl<'s> Translator<'s> {
    pub fn new(schema: &'s GraphSchema) -> Self {
        Self {
            schema,
            max_selection_depth: DEFAULT_MAX_SELECTION_DEPTH,
        }
    }

    pub fn with_max_selection_depth(mut self, depth: usize) -> Self {
        self.max_selection_depth = depth;
        self
    }

    pub fn translate(&self, operation: &Operation, auth: &AuthContext) -> Result<CypherStatement, TranslateError> {
        let root = &operation.root;
        let depth = root.depth();
        if depth > self.max_selection_depth {
            return Err(TranslateError::SelectionTooDeep {
                depth,
                max: self.max_selection_depth,
            });
        }

        let field = self
            .schema
            .root_field(&root.name)
            .ok_or_else(|| TranslateError::UnknownRootField {
                field: root.name.clone(),
            })?;
        let expected = match field {
            RootField::Read(_) | RootField::Connection(_) | RootField::Aggregate(_) => OperationKind::Query,
            RootField::Create(_) | RootField::Update(_) | RootField::Delete(_) => OperationKind::Mutation,
        };
        if expected != operation.kind {
            let kind = match operation.kind {
                OperationKind::Query => "query",
                OperationKind::Mutation => "mutation",
            };
            return Err(TranslateError::invalid_argument(
                root.name.as_str(),
                format!("`{}` is not a {} field", root.name, kind),
            ));
        }
        let node = self
            .schema
            .node(field.type_name())
            .ok_or_else(|| TranslateError::UnknownRootField {
                field: root.name.clone(),
            })?;

        let enabled = match field {
            RootField::Read(_) | RootField::Connection(_) => node.query.read,
            RootField::Aggregate(_) => node.query.aggregate,
            RootField::Create(_) => node.mutation_enabled(MutationKind::Create),
            RootField::Update(_) => node.mutation_enabled(MutationKind::Update),
            RootField::Delete(_) => node.mutation_enabled(MutationKind::Delete),
        };
        if !enabled {
            return Err(TranslateError::OperationDisabled {
                type_name: node.name.clone(),
                operation: root.name.clone(),
            });
        }
        log::debug!("{} resolved to {:?}", root.name, field);

        let mut ctx = TranslationContext::new(self.schema, auth);
        let clauses = match field {
            RootField::Read(_) => read::root_read(&mut ctx, node, root)?,
            RootField::Connection(_) => root_connection(&mut ctx, node, root)?,
            RootField::Aggregate(_) => aggregate::root_aggregate(&mut ctx, node, root)?,
            RootField::Create(_) => create::root_create(&mut ctx, node, root)?,
            RootField::Update(_) => update::root_update(&mut ctx, node, root)?,
            RootField::Delete(_) => delete::root_delete(&mut ctx, node, root)?,
        };
        let statement = ctx.into_statement(clauses).render();
        log::debug!(
            "{}: {} parameter(s), fingerprint {}",
            root.name,
            statement.params.len(),
            statement.fingerprint()
        );
        Ok(statement)
    }
}

/// Translate with default settings.
pub fn translate(
    schema: &GraphSchema,
    operation: &Operation,
    auth: &AuthContext,
) -> Result<CypherStatement, TranslateError> {
    Translator::new(schema).translate(operation, auth)
}
