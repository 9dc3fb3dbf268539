//! Connection-shaped reads: `{ totalCount, edges { cursor, node, properties }, pageInfo }`.
//!
//! Every matched row is collected first so `totalCount` counts the whole
//! filtered pattern. The page is then cut from that collection with
//! `LIMIT first + 1`; the extra row only decides `hasNextPage`.

use serde_json::Value;

use crate::auth::{check_authentication, read_access, AuthTarget};
use crate::cypher::{
    Clause, Expr, NodePattern, Operator, Pattern, Projection, ProjectionEntry, ProjectionItem,
    Variable,
};
use crate::filter::{CompiledFilter, FilterCompiler, ValueMode};
use crate::graph_catalog::{
    AuthOperation, FieldContainer, NodeSchema, PropertiesSchema, RelationshipSchema,
    RelationshipTarget,
};
use crate::translator::context::TranslationContext;
use crate::translator::errors::TranslateError;
use crate::translator::operation::FieldSelection;
use crate::translator::patterns::relationship_pattern;
use crate::translator::projection::{project_node, selected_field_rules, TYPENAME};

use super::cursor::{cursor_expr, offset_after};
use super::options::{effective_limit, non_negative, parse_sort, sort_items, SortField};

/// Page window requested by `first` / `after` / `sort`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Window {
    node_sort: Vec<SortField>,
    edge_sort: Vec<SortField>,
    first: Option<u64>,
    offset: u64,
}

impl Window {
    fn from_selection(
        location: &str,
        selection: &FieldSelection,
        node: Option<&NodeSchema>,
        relationship: bool,
    ) -> Result<Self, TranslateError> {
        let first = match selection.argument("first") {
            // one extra row is fetched for hasNextPage
            Some(value) => match non_negative(location, "first", value)? {
                first if first == i64::MAX as u64 => {
                    return Err(TranslateError::invalid_argument(
                        format!("{}.first", location),
                        "value is out of range",
                    ))
                }
                first => Some(first),
            },
            None => None,
        };
        let after = match selection.argument("after") {
            Some(Value::String(cursor)) => Some(cursor.as_str()),
            Some(_) => {
                return Err(TranslateError::invalid_argument(
                    format!("{}.after", location),
                    "expected a cursor string",
                ))
            }
            None => None,
        };

        let mut window = Window {
            first: effective_limit(first, node.and_then(|n| n.limit)),
            offset: offset_after(after)?,
            ..Default::default()
        };
        if let Some(sort) = selection.argument("sort") {
            if relationship {
                // [{ node: { name: ASC } }, { edge: { screenTime: DESC } }]
                let entries: Vec<&Value> = match sort {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for entry in entries {
                    let object = entry.as_object().ok_or_else(|| {
                        TranslateError::invalid_argument(format!("{}.sort", location), "expected a list of objects")
                    })?;
                    for (side, fields) in object {
                        let parsed = parse_sort(&format!("{}.sort.{}", location, side), fields)?;
                        match side.as_str() {
                            "node" => window.node_sort.extend(parsed),
                            "edge" => window.edge_sort.extend(parsed),
                            _ => {
                                return Err(TranslateError::invalid_argument(
                                    format!("{}.sort.{}", location, side),
                                    "expected node or edge",
                                ))
                            }
                        }
                    }
                }
            } else {
                window.node_sort = parse_sort(location, sort)?;
            }
        }
        Ok(window)
    }
}

/// Where the collected `{ node, relationship }` rows come from.
struct Source {
    clauses: Vec<Clause>,
    edges: Variable,
    /// Rows already carry projected nodes (abstract targets)
    projected: bool,
}

/// `<plural>Connection` at the root. The node is bound as `this`.
pub fn root_connection<'a>(
    ctx: &mut TranslationContext<'a>,
    node: &'a NodeSchema,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    check_authentication(ctx, node, AuthOperation::Read)?;
    let this = Variable::this();
    ctx.scope.bind("this", this.clone());
    let location = selection.name.clone();
    let window = Window::from_selection(&location, selection, Some(node), false)?;

    let user = match selection.object_argument("where") {
        Some(filter) => FilterCompiler::new(ctx, ValueMode::Literal).node_where(node, &this, filter)?,
        None => CompiledFilter::default(),
    };
    let node_selections = node_selections(selection);
    let target = AuthTarget::node(node).with_fields(selected_field_rules(ctx.schema, node, &node_selections));
    let access = read_access(ctx, &target, &this, AuthOperation::Read)?;
    let matched = Clause::matching(Pattern::node(NodePattern::new(&this, &node.labels)), None);

    let edges = ctx.fresh_value("connection.edges");
    let mut clauses = user.and(access).apply_to(matched);
    clauses.push(Clause::With(Projection::items(vec![ProjectionItem::aliased(
        Expr::call("collect", vec![Expr::Map(vec![("node".to_string(), Expr::var(&this))])]),
        &edges,
    )])));

    let source = Source {
        clauses,
        edges,
        projected: false,
    };
    let (mut clauses, result) = shape(ctx, source, Some(node), None, &window, selection)?;
    clauses.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
        result, &this,
    )])));
    log::debug!("{}: connection over {}", location, node.name);
    Ok(clauses)
}

/// `<relationship>Connection` under a projected node.
pub fn relationship_connection<'a>(
    ctx: &mut TranslationContext<'a>,
    parent: &Variable,
    owner: &'a NodeSchema,
    relationship: &'a RelationshipSchema,
    selection: &FieldSelection,
) -> Result<(Clause, Variable), TranslateError> {
    let schema = ctx.schema;
    let location = format!("{}.{}", owner.name, selection.name);
    ctx.enter();
    let result = ctx.fresh_value(location.clone());
    let properties = relationship
        .properties
        .as_deref()
        .and_then(|name| schema.relationship_properties(name));
    let concrete = match &relationship.target {
        RelationshipTarget::Node(name) => schema.node(name),
        _ => None,
    };
    let window = Window::from_selection(&location, selection, concrete, true)?;
    let node_selections = node_selections(selection);
    let edges = ctx.fresh_value(format!("{}.edges", location));

    let source = match concrete {
        Some(target) => {
            let (node, edge) = (
                ctx.fresh_entity(format!("{}.node", location)),
                ctx.fresh_entity(format!("{}.edge", location)),
            );
            let mut clauses = edge_rows(ctx, parent, relationship, target, &node, &edge, selection)?;
            clauses.push(Clause::With(Projection::items(vec![ProjectionItem::aliased(
                Expr::call("collect", vec![edge_map(Expr::var(&node), Expr::var(&edge))]),
                &edges,
            )])));
            Source {
                clauses,
                edges,
                projected: false,
            }
        }
        None => {
            let item = ctx.fresh_value(format!("{}.item", location));
            let mut branches = Vec::new();
            for member in relationship.target.concrete_types() {
                let target = schema
                    .node(member)
                    .ok_or_else(|| TranslateError::unknown_field(&owner.name, &relationship.name))?;
                let node = ctx.fresh_entity(format!("{}.{}", location, member));
                let edge = ctx.fresh_entity(format!("{}.{}.edge", location, member));
                let mut branch = vec![Clause::With(Projection::variables(&[parent]))];
                branch.extend(edge_rows(ctx, parent, relationship, target, &node, &edge, selection)?);
                let projection = project_node(ctx, target, &node, &node_selections, true)?;
                branch.extend(projection.subqueries);
                branch.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
                    edge_map(projection.map, Expr::var(&edge)),
                    &item,
                )])));
                branches.push(branch);
            }
            Source {
                clauses: vec![
                    Clause::call(&[], vec![Clause::Union(branches)]),
                    Clause::With(Projection::items(vec![ProjectionItem::aliased(
                        Expr::call("collect", vec![Expr::var(&item)]),
                        &edges,
                    )])),
                ],
                edges,
                projected: true,
            }
        }
    };

    let (mut body, map) = shape(ctx, source, concrete, properties, &window, selection)?;
    body.push(Clause::Return(Projection::items(vec![ProjectionItem::aliased(
        map, &result,
    )])));
    ctx.leave();
    Ok((Clause::call(&[parent], body), result))
}

/// `MATCH (parent)-[edge]-(node:Label)` narrowed by the connection `where`
/// and the target's read access.
fn edge_rows<'a>(
    ctx: &mut TranslationContext<'a>,
    parent: &Variable,
    relationship: &'a RelationshipSchema,
    target: &'a NodeSchema,
    node: &Variable,
    edge: &Variable,
    selection: &FieldSelection,
) -> Result<Vec<Clause>, TranslateError> {
    check_authentication(ctx, target, AuthOperation::Read)?;
    let pattern = relationship_pattern(parent, relationship, Some(edge), node, &target.labels);
    let user = match selection.object_argument("where") {
        Some(filter) => {
            FilterCompiler::new(ctx, ValueMode::Literal).connection_where(relationship, node, edge, filter)?
        }
        None => CompiledFilter::default(),
    };
    let rules = selected_field_rules(ctx.schema, target, &node_selections(selection));
    let access = read_access(ctx, &AuthTarget::node(target).with_fields(rules), node, AuthOperation::Read)?;
    Ok(user.and(access).apply_to(Clause::matching(pattern, None)))
}

fn edge_map(node: Expr, relationship: Expr) -> Expr {
    Expr::Map(vec![
        ("node".to_string(), node),
        ("relationship".to_string(), relationship),
    ])
}

/// Selections under `edges { node { ... } }`.
fn node_selections(selection: &FieldSelection) -> Vec<FieldSelection> {
    selection
        .selections
        .iter()
        .filter(|s| s.name == "edges")
        .flat_map(|edges| edges.selections.iter().filter(|s| s.name == "node"))
        .flat_map(|node| node.selections.iter().cloned())
        .collect()
}

/// Cut the page out of the collected rows and build the connection map.
///
/// ```text
/// WITH var0, size(var0) AS var1
/// CALL {
///     WITH var0
///     UNWIND var0 AS var2
///     WITH var2.node AS this3, var2.relationship AS this4
///     WITH *
///     ORDER BY ...
///     SKIP $param0
///     LIMIT $param1
///     WITH collect({ node: this3 { ... }, properties: this4 { ... } }) AS var5
///     RETURN var5[0..$param2] AS var6, size(var5) > $param3 AS var7
/// }
/// ```
fn shape<'a>(
    ctx: &mut TranslationContext<'a>,
    source: Source,
    node_type: Option<&'a NodeSchema>,
    properties: Option<&'a PropertiesSchema>,
    window: &Window,
    selection: &FieldSelection,
) -> Result<(Vec<Clause>, Expr), TranslateError> {
    let Source {
        mut clauses,
        edges,
        projected,
    } = source;
    let total = ctx.fresh_value("connection.totalCount");
    clauses.push(Clause::With(Projection::items(vec![
        ProjectionItem::bare(&edges),
        ProjectionItem::aliased(Expr::call("size", vec![Expr::var(&edges)]), &total),
    ])));

    let page_selected = selection
        .selections
        .iter()
        .any(|s| s.name == "edges" || s.name == "pageInfo");
    let page = ctx.fresh_value("connection.page");
    let has_next = ctx.fresh_value("connection.hasNext");
    if page_selected {
        clauses.push(page_subquery(
            ctx, &edges, node_type, properties, projected, window, selection, &page, &has_next,
        )?);
    }

    let mut entries = Vec::new();
    for field in &selection.selections {
        let key = field.response_key().to_string();
        let value = match field.name.as_str() {
            "totalCount" => Expr::var(&total),
            "edges" => edges_list(ctx, &page, window, field)?,
            "pageInfo" => page_info(&page, &has_next, window, field)?,
            TYPENAME => Expr::string(format!(
                "{}Connection",
                node_type.map(|n| n.name.as_str()).unwrap_or("Node")
            )),
            other => return Err(TranslateError::unknown_field(format!("{}Connection", selection.name), other)),
        };
        entries.push((key, value));
    }
    Ok((clauses, Expr::Map(entries)))
}

#[allow(clippy::too_many_arguments)]
fn page_subquery<'a>(
    ctx: &mut TranslationContext<'a>,
    edges: &Variable,
    node_type: Option<&'a NodeSchema>,
    properties: Option<&'a PropertiesSchema>,
    projected: bool,
    window: &Window,
    selection: &FieldSelection,
    page: &Variable,
    has_next: &Variable,
) -> Result<Clause, TranslateError> {
    ctx.enter();
    let edge = ctx.fresh_value("connection.edge");
    let node = match node_type {
        Some(_) if !projected => ctx.fresh_entity("connection.node"),
        _ => ctx.fresh_value("connection.node"),
    };
    let relationship = ctx.fresh_entity("connection.relationship");
    let rows = ctx.fresh_value("connection.rows");

    let mut body = vec![
        Clause::Unwind {
            list: Expr::var(edges),
            alias: edge.clone(),
        },
        Clause::With(Projection::items(vec![
            ProjectionItem::aliased(Expr::prop(&edge, "node"), &node),
            ProjectionItem::aliased(Expr::prop(&edge, "relationship"), &relationship),
        ])),
    ];

    let mut order_by = Vec::new();
    if !window.node_sort.is_empty() {
        let owner: &dyn FieldContainer = node_type
            .map(|n| n as &dyn FieldContainer)
            .ok_or_else(|| {
                TranslateError::invalid_argument(format!("{}.sort", selection.name), "cannot sort by node of an abstract type")
            })?;
        order_by.extend(sort_items(ctx, owner, &node, &window.node_sort, &mut body)?);
    }
    if !window.edge_sort.is_empty() {
        let owner = properties.ok_or_else(|| {
            TranslateError::invalid_argument(format!("{}.sort.edge", selection.name), "relationship has no properties")
        })?;
        order_by.extend(sort_items(ctx, owner, &relationship, &window.edge_sort, &mut body)?);
    }
    if !order_by.is_empty() || window.offset > 0 || window.first.is_some() {
        let mut paging = Projection::star();
        paging.order_by = order_by;
        paging.skip = (window.offset > 0).then(|| Expr::value(window.offset));
        paging.limit = window.first.and_then(|first| first.checked_add(1)).map(Expr::value);
        body.push(Clause::With(paging));
    }

    let mut row = Vec::new();
    for edges_field in selection.selections.iter().filter(|s| s.name == "edges") {
        for field in &edges_field.selections {
            match field.name.as_str() {
                "node" if !row.iter().any(|(k, _): &(String, Expr)| k == "node") => {
                    let value = match node_type {
                        Some(target) if !projected => {
                            let projection = project_node(ctx, target, &node, &field.selections, false)?;
                            body.extend(projection.subqueries);
                            projection.map
                        }
                        _ => Expr::var(&node),
                    };
                    row.push(("node".to_string(), value));
                }
                "properties" if !row.iter().any(|(k, _): &(String, Expr)| k == "properties") => {
                    let owner = properties.ok_or_else(|| {
                        TranslateError::unknown_field(format!("{}Connection", selection.name), "properties")
                    })?;
                    row.push((
                        "properties".to_string(),
                        project_properties(owner, &relationship, &field.selections)?,
                    ));
                }
                _ => {}
            }
        }
    }

    body.push(Clause::With(Projection::items(vec![ProjectionItem::aliased(
        Expr::call("collect", vec![Expr::Map(row)]),
        &rows,
    )])));
    let (page_expr, next_expr) = match window.first {
        Some(first) => (
            Expr::slice(Expr::var(&rows), Some(Expr::int(0)), Some(Expr::value(first))),
            Expr::binary(
                Operator::GreaterThan,
                Expr::call("size", vec![Expr::var(&rows)]),
                Expr::value(first),
            ),
        ),
        None => (Expr::var(&rows), Expr::bool(false)),
    };
    body.push(Clause::Return(Projection::items(vec![
        ProjectionItem::aliased(page_expr, page),
        ProjectionItem::aliased(next_expr, has_next),
    ])));
    ctx.leave();
    Ok(Clause::call(&[edges], body))
}

/// `this4 { .role, .screenTime }` over relationship properties.
fn project_properties(
    owner: &PropertiesSchema,
    relationship: &Variable,
    selections: &[FieldSelection],
) -> Result<Expr, TranslateError> {
    let mut entries = Vec::new();
    for field in selections {
        let key = field.response_key().to_string();
        if field.name == TYPENAME {
            entries.push(ProjectionEntry::Field(key, Expr::string(owner.name.as_str())));
            continue;
        }
        let attribute = owner
            .attribute(&field.name)
            .ok_or_else(|| TranslateError::unknown_field(&owner.name, &field.name))?;
        if key == attribute.name {
            entries.push(ProjectionEntry::Property(key));
        } else {
            entries.push(ProjectionEntry::Field(key, Expr::prop(relationship, attribute.name.as_str())));
        }
    }
    Ok(Expr::MapProjection {
        variable: relationship.clone(),
        entries,
    })
}

/// Absolute position of the page row at `index`.
fn position(index: Expr, window: &Window) -> Expr {
    if window.offset == 0 {
        index
    } else {
        Expr::binary(Operator::Addition, index, Expr::value(window.offset))
    }
}

/// `[i IN range(0, size(page) - 1) | { cursor: ..., node: page[i].node }]`
fn edges_list(
    ctx: &mut TranslationContext<'_>,
    page: &Variable,
    window: &Window,
    field: &FieldSelection,
) -> Result<Expr, TranslateError> {
    let index = ctx.fresh_value("connection.index");
    let row = Expr::index(Expr::var(page), Expr::var(&index));
    let mut entries = Vec::new();
    for edge_field in &field.selections {
        let key = edge_field.response_key().to_string();
        let value = match edge_field.name.as_str() {
            "cursor" => cursor_expr(position(Expr::var(&index), window)),
            "node" => Expr::property_of(row.clone(), "node"),
            "properties" => Expr::property_of(row.clone(), "properties"),
            other => return Err(TranslateError::unknown_field("Edge", other)),
        };
        entries.push((key, value));
    }
    let last = Expr::binary(
        Operator::Subtraction,
        Expr::call("size", vec![Expr::var(page)]),
        Expr::int(1),
    );
    Ok(Expr::comprehension(
        &index,
        Expr::call("range", vec![Expr::int(0), last]),
        None,
        Some(Expr::Map(entries)),
    ))
}

fn page_info(
    page: &Variable,
    has_next: &Variable,
    window: &Window,
    field: &FieldSelection,
) -> Result<Expr, TranslateError> {
    let non_empty = Expr::binary(
        Operator::GreaterThan,
        Expr::call("size", vec![Expr::var(page)]),
        Expr::int(0),
    );
    let mut entries = Vec::new();
    for info in &field.selections {
        let key = info.response_key().to_string();
        let value = match info.name.as_str() {
            "hasNextPage" => Expr::var(has_next),
            "hasPreviousPage" => Expr::bool(window.offset > 0),
            "startCursor" => Expr::Case {
                branches: vec![(non_empty.clone(), cursor_expr(position(Expr::int(0), window)))],
                default: None,
            },
            "endCursor" => {
                let last = Expr::binary(
                    Operator::Subtraction,
                    Expr::call("size", vec![Expr::var(page)]),
                    Expr::int(1),
                );
                Expr::Case {
                    branches: vec![(non_empty.clone(), cursor_expr(position(last, window)))],
                    default: None,
                }
            }
            other => return Err(TranslateError::unknown_field("PageInfo", other)),
        };
        entries.push((key, value));
    }
    Ok(Expr::Map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::graph_catalog::testing::movie_schema;
    use crate::pagination::cursor::encode;
    use serde_json::json;

    fn edges_node(fields: &[&str]) -> FieldSelection {
        FieldSelection::new("edges")
            .with_selections(vec![FieldSelection::new("node").with_selections(FieldSelection::leaves(fields))])
    }

    #[test]
    fn test_root_connection_counts_before_paging() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let selection = FieldSelection::new("actorsConnection")
            .with_arguments(json!({ "first": 1 }))
            .with_selections(vec![FieldSelection::new("totalCount"), edges_node(&["name"])]);
        let clauses = root_connection(&mut ctx, schema.node("Actor").unwrap(), &selection).unwrap();
        let rendered = ctx.into_statement(clauses).render();
        assert_eq!(
            rendered.cypher,
            "MATCH (this:Actor)\n\
             WITH collect({ node: this }) AS var0\n\
             WITH var0, size(var0) AS var1\n\
             CALL {\n    WITH var0\n    UNWIND var0 AS var2\n    \
             WITH var2.node AS this3, var2.relationship AS this4\n    \
             WITH *\n    LIMIT $param0\n    \
             WITH collect({ node: this3 { .name } }) AS var5\n    \
             RETURN var5[0..$param1] AS var6, size(var5) > $param2 AS var7\n}\n\
             RETURN { totalCount: var1, edges: [var8 IN range(0, size(var6) - 1) | { node: var6[var8].node }] } AS this"
        );
        assert_eq!(rendered.params["param0"], json!(2));
        assert_eq!(rendered.params["param1"], json!(1));
    }

    #[test]
    fn test_after_cursor_shifts_window() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let selection = FieldSelection::new("moviesConnection")
            .with_arguments(json!({ "first": 2, "after": encode(3), "sort": [{ "title": "ASC" }] }))
            .with_selections(vec![FieldSelection::new("pageInfo")
                .with_selections(FieldSelection::leaves(&["hasPreviousPage", "hasNextPage"]))]);
        let clauses = root_connection(&mut ctx, schema.node("Movie").unwrap(), &selection).unwrap();
        let rendered = ctx.into_statement(clauses).render();
        assert!(rendered
            .cypher
            .contains("WITH *\n    ORDER BY this3.title ASC\n    SKIP $param0\n    LIMIT $param1"));
        assert!(rendered.cypher.contains("pageInfo: { hasPreviousPage: true, hasNextPage: var7 }"));
        assert_eq!(rendered.params["param0"], json!(4));
        assert_eq!(rendered.params["param1"], json!(3));
    }

    #[test]
    fn test_first_beyond_cypher_integer_range() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let movie = schema.node("Movie").unwrap();
        for first in [u64::MAX, i64::MAX as u64] {
            let mut ctx = TranslationContext::new(&schema, &auth);
            let selection = FieldSelection::new("moviesConnection")
                .with_arguments(json!({ "first": first }))
                .with_selections(vec![FieldSelection::new("totalCount")]);
            let err = root_connection(&mut ctx, movie, &selection).unwrap_err();
            assert!(matches!(err, TranslateError::InvalidArgument { .. }));
        }

        let mut ctx = TranslationContext::new(&schema, &auth);
        let selection = FieldSelection::new("moviesConnection")
            .with_arguments(json!({ "first": i64::MAX - 1 }))
            .with_selections(vec![FieldSelection::new("totalCount")]);
        let clauses = root_connection(&mut ctx, movie, &selection).unwrap();
        let rendered = ctx.into_statement(clauses).render();
        assert_eq!(rendered.params["param0"], json!(i64::MAX));
    }

    #[test]
    fn test_invalid_after_cursor() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let selection = FieldSelection::new("moviesConnection")
            .with_arguments(json!({ "after": "bm9wZQ==" }))
            .with_selections(vec![FieldSelection::new("totalCount")]);
        let err = root_connection(&mut ctx, schema.node("Movie").unwrap(), &selection).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidCursor { .. }));
    }

    #[test]
    fn test_relationship_connection_with_edge_filter_and_properties() {
        let schema = movie_schema();
        let auth = AuthContext::anonymous();
        let mut ctx = TranslationContext::new(&schema, &auth);
        let movie = schema.node("Movie").unwrap();
        let this = Variable::this();
        let selection = FieldSelection::new("actorsConnection")
            .with_arguments(json!({ "where": { "edge": { "role": "Neo" } } }))
            .with_selections(vec![FieldSelection::new("edges").with_selections(vec![
                FieldSelection::new("properties").with_selections(FieldSelection::leaves(&["role"])),
                FieldSelection::new("node").with_selections(FieldSelection::leaves(&["name"])),
            ])]);
        let (clause, _) =
            relationship_connection(&mut ctx, &this, movie, movie.relationship("actors").unwrap(), &selection)
                .unwrap();
        let text = ctx.into_statement(vec![clause]).render().cypher;
        assert!(text.starts_with(
            "CALL {\n    WITH this\n    MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)\n    WHERE this0.role = $param0\n    \
             WITH collect({ node: this1, relationship: this0 }) AS var2"
        ));
        assert!(text.contains("WITH collect({ properties: this6 { .role }, node: this5 { .name } }) AS var7"));
        // Actor carries a default limit of 20
        assert!(text.contains("LIMIT $param1"));
    }
}
