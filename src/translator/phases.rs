//! Mutation plan → write clauses.
//!
//! Nested operations on a node run in a fixed phase order, whatever order the
//! arguments were given in:
//!
//! `DISCONNECT → DELETE → CREATE → CONNECT → CONNECT_OR_CREATE → UPDATE`
//!
//! Every nested operation becomes its own `CALL { WITH <parent> ... RETURN count(*) }`
//! so an operation matching no rows never removes the parent row.

use serde_json::Value;

use crate::auth::{check_authentication, read_access, validate_clauses, AuthTarget};
use crate::cypher::{Clause, Expr, NodePattern, Operator, Pattern, SetItem, Variable};
use crate::filter::{CompiledFilter, FilterCompiler, ValueMode};
use crate::filter::values::stored_value;
use crate::graph_catalog::{
    AttributeKind, AttributeSchema, AuthOperation, DefaultPolicy, FieldContainer, NestedOperation,
    RelationshipSchema, Timing,
};

use super::cardinality::cardinality_guards;
use super::context::TranslationContext;
use super::errors::TranslateError;
use super::mutation_plan::{
    ConnectInput, ConnectOrCreateInput, CreateInput, DeleteInput, DisconnectInput, NestedCreate, NestedUpdate,
    RelationshipInput, SetOp, SetOperator, UpdateInput,
};
use super::patterns::relationship_pattern;

const PHASES: [NestedOperation; 6] = [
    NestedOperation::Disconnect,
    NestedOperation::Delete,
    NestedOperation::Create,
    NestedOperation::Connect,
    NestedOperation::ConnectOrCreate,
    NestedOperation::Update,
];

pub struct PhaseCompiler<'c, 'a> {
    ctx: &'c mut TranslationContext<'a>,
}

impl<'c, 'a> PhaseCompiler<'c, 'a> {
    pub fn new(ctx: &'c mut TranslationContext<'a>) -> Self {
        Self { ctx }
    }

    /// `CREATE (n:Labels) SET ...` followed by the node's nested operations.
    pub fn create_node(&mut self, input: &CreateInput<'a>, node: &Variable) -> Result<Vec<Clause>, TranslateError> {
        check_authentication(self.ctx, input.node, AuthOperation::Create)?;
        let mut clauses = vec![Clause::Create(Pattern::node(NodePattern::new(node, &input.node.labels)))];
        let items = self.create_items(input.node, node, &input.properties, None);
        if !items.is_empty() {
            clauses.push(Clause::Set(items));
        }
        let nested = self.phases(node, &input.relationships)?;
        if !nested.is_empty() {
            clauses.push(Clause::with_star(None));
            clauses.extend(nested);
        }
        Ok(clauses)
    }

    /// Checks after a node was created: a guard for every `one` relationship
    /// and the `AFTER` validate rules for `CREATE`.
    pub fn create_checks(&mut self, input: &CreateInput<'a>, node: &Variable) -> Result<Vec<Clause>, TranslateError> {
        let mut clauses = vec![Clause::with_star(None)];
        clauses.extend(cardinality_guards(self.ctx, node, input.node, input.node.one_relationships()));
        let target = AuthTarget::node(input.node)
            .with_fields(input.properties.iter().map(|(attribute, _)| &attribute.authorization));
        clauses.extend(validate_clauses(self.ctx, &target, node, AuthOperation::Create, Timing::After)?);
        Ok(clauses)
    }

    /// `SET` of the node's own attributes, then its nested operations, then
    /// guards for relationships whose edges changed and the `AFTER` validate
    /// rules for `UPDATE`.
    pub fn update_node(&mut self, input: &UpdateInput<'a>, node: &Variable) -> Result<Vec<Clause>, TranslateError> {
        let mut clauses = Vec::new();
        let items = self.update_items(input.node, node, &input.set, true)?;
        if !items.is_empty() {
            clauses.push(Clause::Set(items));
        }
        clauses.push(Clause::with_star(None));
        clauses.extend(self.phases(node, &input.relationships)?);

        let mut touched: Vec<&RelationshipSchema> = Vec::new();
        for nested in input.relationships.iter().filter(|nested| nested.changes_edges()) {
            if !touched.iter().any(|seen| std::ptr::eq(*seen, nested.relationship)) {
                touched.push(nested.relationship);
            }
        }
        clauses.extend(cardinality_guards(self.ctx, node, input.node, touched));

        let target = AuthTarget::node(input.node)
            .with_fields(input.set.iter().map(|op| &op.attribute.authorization));
        clauses.extend(validate_clauses(self.ctx, &target, node, AuthOperation::Update, Timing::After)?);
        Ok(clauses)
    }

    /// One sub-query per nested operation, phase by phase.
    pub fn phases(&mut self, parent: &Variable, inputs: &[RelationshipInput<'a>]) -> Result<Vec<Clause>, TranslateError> {
        let mut clauses = Vec::new();
        for phase in PHASES {
            for input in inputs {
                let count = match phase {
                    NestedOperation::Disconnect => input.ops.disconnect.len(),
                    NestedOperation::Delete => input.ops.delete.len(),
                    NestedOperation::Create => input.ops.create.len(),
                    NestedOperation::Connect => input.ops.connect.len(),
                    NestedOperation::ConnectOrCreate => input.ops.connect_or_create.len(),
                    NestedOperation::Update => input.ops.update.len(),
                };
                if count > 0 {
                    log::debug!(
                        "{} {}: {} {} operation(s)",
                        input.relationship.name,
                        input.target.name,
                        count,
                        phase
                    );
                }
                for index in 0..count {
                    self.ctx.enter();
                    let body = match phase {
                        NestedOperation::Disconnect => self.disconnect(parent, input, &input.ops.disconnect[index]),
                        NestedOperation::Delete => self.delete(parent, input, &input.ops.delete[index]),
                        NestedOperation::Create => self.create(parent, input, &input.ops.create[index]),
                        NestedOperation::Connect => self.connect(parent, input, &input.ops.connect[index]),
                        NestedOperation::ConnectOrCreate => {
                            self.connect_or_create(parent, input, &input.ops.connect_or_create[index])
                        }
                        NestedOperation::Update => self.update(parent, input, &input.ops.update[index]),
                    };
                    self.ctx.leave();
                    let mut body = body?;
                    let count = self.ctx.fresh_value("phase.count");
                    body.push(Clause::return_count(&count));
                    clauses.push(Clause::call(&[parent], body));
                }
            }
        }
        Ok(clauses)
    }

    /// ```text
    /// MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
    /// WHERE this1.name = $param0
    /// DELETE this0
    /// ```
    fn disconnect(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        item: &DisconnectInput<'a>,
    ) -> Result<Vec<Clause>, TranslateError> {
        let (edge, target) = (self.ctx.fresh_entity("disconnect.edge"), self.ctx.fresh_entity("disconnect.node"));
        let filter = self.connection_filter(input, &target, &edge, item.filter.as_ref())?;
        let access = self.relationship_access(parent, input, &target, AuthOperation::DeleteRelationship)?;
        let pattern = relationship_pattern(parent, input.relationship, Some(&edge), &target, &input.target.labels);
        let mut clauses = filter.and(access).apply_to(Clause::matching(pattern, None));
        clauses.extend(self.phases(&target, &item.disconnect)?);
        clauses.push(Clause::Delete {
            detach: false,
            targets: vec![Expr::var(&edge)],
        });
        clauses.extend(self.relationship_checks(parent, input, &target, AuthOperation::DeleteRelationship)?);
        Ok(clauses)
    }

    /// Nested deletes run before the matched node is detached and deleted.
    fn delete(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        item: &DeleteInput<'a>,
    ) -> Result<Vec<Clause>, TranslateError> {
        check_authentication(self.ctx, input.target, AuthOperation::Delete)?;
        let (edge, target) = (self.ctx.fresh_entity("delete.edge"), self.ctx.fresh_entity("delete.node"));
        let filter = self.connection_filter(input, &target, &edge, item.filter.as_ref())?;
        let access = read_access(self.ctx, &AuthTarget::node(input.target), &target, AuthOperation::Delete)?;
        let pattern = relationship_pattern(parent, input.relationship, Some(&edge), &target, &input.target.labels);
        let mut clauses = filter.and(access).apply_to(Clause::matching(pattern, None));
        clauses.extend(self.delete_nested(&target, &item.delete)?);
        clauses.push(Clause::Delete {
            detach: true,
            targets: vec![Expr::var(&target)],
        });
        Ok(clauses)
    }

    /// Nested `delete` trees of a node about to be deleted.
    pub fn delete_nested(&mut self, node: &Variable, inputs: &[RelationshipInput<'a>]) -> Result<Vec<Clause>, TranslateError> {
        self.phases(node, inputs)
    }

    fn create(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        item: &NestedCreate<'a>,
    ) -> Result<Vec<Clause>, TranslateError> {
        let target = self.ctx.fresh_entity("create.node");
        let edge = self.ctx.fresh_entity("create.edge");
        let parent_access = self.parent_access(parent, input, AuthOperation::CreateRelationship)?;
        let mut clauses = guard_clauses(parent_access);
        clauses.extend(self.create_node(&item.node, &target)?);
        clauses.push(Clause::Merge {
            pattern: relationship_pattern(parent, input.relationship, Some(&edge), &target, &[]),
            on_create: Vec::new(),
        });
        let edge_items = self.edge_create_items(input, &edge, &item.edge);
        if !edge_items.is_empty() {
            clauses.push(Clause::Set(edge_items));
        }
        clauses.extend(self.create_checks(&item.node, &target)?);
        clauses.extend(self.relationship_checks(parent, input, &target, AuthOperation::CreateRelationship)?);
        Ok(clauses)
    }

    /// ```text
    /// MATCH (this0:Person)
    /// WHERE this0.id = $param0
    /// MERGE (this)<-[this1:DIRECTED]-(this0)
    /// ```
    fn connect(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        item: &ConnectInput<'a>,
    ) -> Result<Vec<Clause>, TranslateError> {
        let target = self.ctx.fresh_entity("connect.node");
        let edge = self.ctx.fresh_entity("connect.edge");
        let filter = match &item.filter {
            Some(map) => FilterCompiler::new(self.ctx, ValueMode::Literal).node_where(input.target, &target, map)?,
            None => CompiledFilter::default(),
        };
        let access = self.relationship_access(parent, input, &target, AuthOperation::CreateRelationship)?;
        let matched = Clause::matching(Pattern::node(NodePattern::new(&target, &input.target.labels)), None);
        let mut clauses = filter.and(access).apply_to(matched);
        clauses.push(Clause::Merge {
            pattern: relationship_pattern(parent, input.relationship, Some(&edge), &target, &[]),
            on_create: Vec::new(),
        });
        let edge_items = self.edge_create_items(input, &edge, &item.edge);
        if !edge_items.is_empty() {
            clauses.push(Clause::Set(edge_items));
        }
        let nested = self.phases(&target, &item.connect)?;
        if !nested.is_empty() {
            clauses.push(Clause::with_star(None));
            clauses.extend(nested);
        }
        clauses.extend(self.relationship_checks(parent, input, &target, AuthOperation::CreateRelationship)?);
        Ok(clauses)
    }

    /// ```text
    /// MERGE (this0:Actor { name: $param0 })
    /// ON CREATE SET this0.born = $param1
    /// MERGE (this)<-[this1:ACTED_IN]-(this0)
    /// ON CREATE SET this1.role = $param2
    /// ```
    fn connect_or_create(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        item: &ConnectOrCreateInput<'a>,
    ) -> Result<Vec<Clause>, TranslateError> {
        check_authentication(self.ctx, input.target, AuthOperation::Create)?;
        let target = self.ctx.fresh_entity("connectOrCreate.node");
        let edge = self.ctx.fresh_entity("connectOrCreate.edge");
        let parent_access = self.parent_access(parent, input, AuthOperation::CreateRelationship)?;

        let mut clauses = guard_clauses(parent_access);
        let (key, value) = &item.key;
        let key_value = stored_value(self.ctx, key, value);
        let on_create = self.create_items(input.target, &target, &item.on_create, Some(&key.name));
        clauses.push(Clause::Merge {
            pattern: Pattern::node(
                NodePattern::new(&target, &input.target.labels).with_properties(vec![(key.name.clone(), key_value)]),
            ),
            on_create,
        });
        let edge_items = self.edge_create_items(input, &edge, &item.edge);
        clauses.push(Clause::Merge {
            pattern: relationship_pattern(parent, input.relationship, Some(&edge), &target, &[]),
            on_create: edge_items,
        });
        clauses.extend(self.relationship_checks(parent, input, &target, AuthOperation::CreateRelationship)?);
        Ok(clauses)
    }

    fn update(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        item: &NestedUpdate<'a>,
    ) -> Result<Vec<Clause>, TranslateError> {
        check_authentication(self.ctx, input.target, AuthOperation::Update)?;
        let (edge, target) = (self.ctx.fresh_entity("update.edge"), self.ctx.fresh_entity("update.node"));
        let filter = self.connection_filter(input, &target, &edge, item.filter.as_ref())?;
        let access = read_access(self.ctx, &AuthTarget::node(input.target), &target, AuthOperation::Update)?;
        let pattern = relationship_pattern(parent, input.relationship, Some(&edge), &target, &input.target.labels);
        let mut clauses = filter.and(access).apply_to(Clause::matching(pattern, None));

        if !item.edge.is_empty() {
            if let Some(properties) = self.edge_properties(input) {
                clauses.push(Clause::Set(self.update_items(properties, &edge, &item.edge, false)?));
            }
        }
        if let Some(node) = &item.node {
            clauses.extend(self.update_node(node, &target)?);
        }
        Ok(clauses)
    }

    /// Connection `where: { node, edge }` over a matched relationship.
    fn connection_filter(
        &mut self,
        input: &RelationshipInput<'a>,
        target: &Variable,
        edge: &Variable,
        filter: Option<&serde_json::Map<String, Value>>,
    ) -> Result<CompiledFilter, TranslateError> {
        match filter {
            Some(map) => {
                FilterCompiler::new(self.ctx, ValueMode::Literal).connection_where(input.relationship, target, edge, map)
            }
            None => Ok(CompiledFilter::default()),
        }
    }

    /// Relationship rules hold on both ends of the edge.
    fn relationship_access(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        target: &Variable,
        operation: AuthOperation,
    ) -> Result<CompiledFilter, TranslateError> {
        let parent_access = self.parent_access(parent, input, operation)?;
        let target_access = read_access(self.ctx, &AuthTarget::node(input.target), target, operation)?;
        Ok(parent_access.and(target_access))
    }

    fn parent_access(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        operation: AuthOperation,
    ) -> Result<CompiledFilter, TranslateError> {
        let target = AuthTarget::node(input.owner).with_fields([&input.relationship.authorization]);
        read_access(self.ctx, &target, parent, operation)
    }

    /// `AFTER` validate rules of a relationship write, on both ends of the edge.
    fn relationship_checks(
        &mut self,
        parent: &Variable,
        input: &RelationshipInput<'a>,
        target: &Variable,
        operation: AuthOperation,
    ) -> Result<Vec<Clause>, TranslateError> {
        let owner = AuthTarget::node(input.owner).with_fields([&input.relationship.authorization]);
        let mut clauses = validate_clauses(self.ctx, &owner, parent, operation, Timing::After)?;
        clauses.extend(validate_clauses(
            self.ctx,
            &AuthTarget::node(input.target),
            target,
            operation,
            Timing::After,
        )?);
        Ok(clauses)
    }

    fn edge_properties(&self, input: &RelationshipInput<'a>) -> Option<&'a dyn FieldContainer> {
        let name = input.relationship.properties.as_deref()?;
        let properties = self.ctx.schema.relationship_properties(name)?;
        Some(properties)
    }

    fn edge_create_items(
        &mut self,
        input: &RelationshipInput<'a>,
        edge: &Variable,
        provided: &[(&'a AttributeSchema, Value)],
    ) -> Vec<SetItem> {
        match self.edge_properties(input) {
            Some(properties) => self.create_items(properties, edge, provided, None),
            None => Vec::new(),
        }
    }

    /// Provided values, generated ids, create timestamps and static defaults,
    /// in attribute declaration order.
    fn create_items(
        &mut self,
        owner: &dyn FieldContainer,
        variable: &Variable,
        provided: &[(&'a AttributeSchema, Value)],
        skip: Option<&str>,
    ) -> Vec<SetItem> {
        let mut items = Vec::new();
        for attribute in owner.attributes() {
            if skip == Some(attribute.name.as_str()) || attribute.is_computed() {
                continue;
            }
            let value = match provided.iter().find(|(assigned, _)| assigned.name == attribute.name) {
                Some((_, value)) => stored_value(self.ctx, attribute, value),
                None => match &attribute.default {
                    DefaultPolicy::GeneratedId => Expr::call("randomUUID", Vec::new()),
                    DefaultPolicy::Timestamp { on_create: true, .. } => Expr::call(timestamp_constructor(attribute), Vec::new()),
                    DefaultPolicy::Value(default) => stored_value(self.ctx, attribute, default),
                    _ => continue,
                },
            };
            items.push(SetItem::property(variable, &attribute.name, value));
        }
        items
    }

    /// Set operations in attribute declaration order, then update timestamps.
    fn update_items(
        &mut self,
        owner: &dyn FieldContainer,
        variable: &Variable,
        set: &[SetOp<'a>],
        timestamps: bool,
    ) -> Result<Vec<SetItem>, TranslateError> {
        let mut items = Vec::new();
        for attribute in owner.attributes() {
            for op in set.iter().filter(|op| op.attribute.name == attribute.name) {
                let current = Expr::prop(variable, &attribute.name);
                let value = match op.operator {
                    SetOperator::Assign => stored_value(self.ctx, attribute, &op.value),
                    SetOperator::Increment => {
                        Expr::binary(Operator::Addition, current, Expr::Value(op.value.clone()))
                    }
                    SetOperator::Decrement => {
                        Expr::binary(Operator::Subtraction, current, Expr::Value(op.value.clone()))
                    }
                    SetOperator::Push => {
                        let pushed = match &op.value {
                            Value::Array(_) => op.value.clone(),
                            single => Value::Array(vec![single.clone()]),
                        };
                        Expr::binary(Operator::Addition, current, stored_value(self.ctx, attribute, &pushed))
                    }
                    SetOperator::Pop => match op.value.as_u64() {
                        Some(0) | None => continue,
                        Some(count) => {
                            let count = i64::try_from(count).map_err(|_| {
                                TranslateError::invalid_argument(
                                    format!("{}_POP", attribute.name),
                                    "count is out of range",
                                )
                            })?;
                            Expr::slice(current, Some(Expr::int(0)), Some(Expr::Value(Value::from(-count))))
                        }
                    },
                };
                items.push(SetItem::property(variable, &attribute.name, value));
            }
            if timestamps && matches!(attribute.default, DefaultPolicy::Timestamp { on_update: true, .. }) {
                items.push(SetItem::property(
                    variable,
                    &attribute.name,
                    Expr::call(timestamp_constructor(attribute), Vec::new()),
                ));
            }
        }
        Ok(items)
    }
}

/// `WITH * WHERE <guard>` for a compiled access check, empty when nothing applies.
fn guard_clauses(access: CompiledFilter) -> Vec<Clause> {
    let mut clauses = access.preludes;
    if access.predicate.is_some() {
        clauses.push(Clause::with_star(access.predicate));
    }
    clauses
}

fn timestamp_constructor(attribute: &AttributeSchema) -> &'static str {
    match &attribute.kind {
        AttributeKind::Temporal(kind) => kind.constructor(),
        _ => "datetime",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::graph_catalog::testing::movie_schema;
    use crate::translator::mutation_plan::MutationPlanner;
    use serde_json::{json, Map};

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_sets_defaults_and_guards_one_relationships() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let movie = schema.node("Movie").unwrap();
        let input = MutationPlanner::new(&schema)
            .create(movie, &object(json!({ "title": "M" })), "input[0]")
            .unwrap();
        let this = Variable::this();
        let mut compiler = PhaseCompiler::new(&mut ctx);
        let mut clauses = compiler.create_node(&input, &this).unwrap();
        clauses.extend(compiler.create_checks(&input, &this).unwrap());
        let text = ctx.into_statement(clauses).render().cypher;
        assert!(text.starts_with(
            "CREATE (this:Movie)\nSET this.id = randomUUID(), this.title = $param0, \
             this.createdAt = datetime(), this.updatedAt = datetime()\nWITH *\nCALL {"
        ));
        assert!(text.contains("\"Movie.director required exactly once\""));
        assert!(text.contains("\"Movie.studio must be less than or equal to one\""));
    }

    #[test]
    fn test_disconnect_runs_before_connect() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let movie = schema.node("Movie").unwrap();
        let planner = MutationPlanner::new(&schema);
        let input = planner
            .update(
                movie,
                &object(json!({
                    "director": {
                        "connect": { "where": { "node": { "id": "p2" } } },
                        "disconnect": { "where": { "node": { "id": "p1" } } }
                    }
                })),
                "update",
            )
            .unwrap();
        let this = Variable::this();
        let clauses = PhaseCompiler::new(&mut ctx).update_node(&input, &this).unwrap();
        let text = ctx.into_statement(clauses).render().cypher;
        assert_eq!(
            text,
            "SET this.updatedAt = datetime()\nWITH *\n\
             CALL {\n    WITH this\n    MATCH (this)<-[this0:DIRECTED]-(this1:Person)\n    WHERE this1.id = $param0\n    DELETE this0\n    RETURN count(*) AS var2\n}\n\
             CALL {\n    WITH this\n    MATCH (this3:Person)\n    WHERE this3.id = $param1\n    MERGE (this)<-[this4:DIRECTED]-(this3)\n    RETURN count(*) AS var5\n}\n\
             CALL {\n    WITH this\n    MATCH (this)<-[this6:DIRECTED]-(:Person)\n    WITH count(this6) AS var7\n    \
             WHERE apoc.util.validatePredicate(NOT (coalesce(var7 = 1, false)), \"Movie.director required exactly once\", [0])\n    \
             RETURN var7 AS var8\n}"
        );
    }

    #[test]
    fn test_connect_or_create_merges_on_key() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let movie = schema.node("Movie").unwrap();
        let inputs = MutationPlanner::new(&schema)
            .top_level(
                movie,
                NestedOperation::ConnectOrCreate,
                &object(json!({ "actors": { "where": { "node": { "name": "Keanu" } },
                                            "onCreate": { "node": { "born": 1964 }, "edge": { "role": "Neo" } } } })),
            )
            .unwrap();
        let clauses = PhaseCompiler::new(&mut ctx).phases(&Variable::this(), &inputs).unwrap();
        let rendered = ctx.into_statement(clauses).render();
        assert_eq!(
            rendered.cypher,
            "CALL {\n    WITH this\n    MERGE (this0:Actor { name: $param0 })\n    ON CREATE SET this0.born = $param1\n    \
             MERGE (this)<-[this1:ACTED_IN]-(this0)\n    ON CREATE SET this1.role = $param2\n    RETURN count(*) AS var2\n}"
        );
        assert_eq!(rendered.params["param0"], json!("Keanu"));
        assert_eq!(rendered.params["param2"], json!("Neo"));
    }

    #[test]
    fn test_update_operators() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let movie = schema.node("Movie").unwrap();
        let input = MutationPlanner::new(&schema)
            .update(
                movie,
                &object(json!({ "tags_POP": 1, "released_INCREMENT": 2, "tags_PUSH": "new" })),
                "update",
            )
            .unwrap();
        let clauses = PhaseCompiler::new(&mut ctx).update_node(&input, &Variable::this()).unwrap();
        let rendered = ctx.into_statement(clauses).render();
        assert_eq!(
            rendered.cypher,
            "SET this.released = this.released + $param0, this.tags = this.tags[0..$param1], \
             this.tags = this.tags + $param2, this.updatedAt = datetime()\nWITH *"
        );
        assert_eq!(rendered.params["param1"], json!(-1));
        assert_eq!(rendered.params["param2"], json!(["new"]));
    }

    #[test]
    fn test_nested_delete_detaches_after_children() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let actor = schema.node("Actor").unwrap();
        let inputs = MutationPlanner::new(&schema)
            .top_level(
                actor,
                NestedOperation::Delete,
                &object(json!({ "movies": [{ "where": { "node": { "title": "M" } } }] })),
            )
            .unwrap();
        let clauses = PhaseCompiler::new(&mut ctx).delete_nested(&Variable::this(), &inputs).unwrap();
        let text = ctx.into_statement(clauses).render().cypher;
        assert_eq!(
            text,
            "CALL {\n    WITH this\n    MATCH (this)-[this0:ACTED_IN]->(this1:Movie)\n    WHERE this1.title = $param0\n    \
             DETACH DELETE this1\n    RETURN count(*) AS var2\n}"
        );
    }
}
