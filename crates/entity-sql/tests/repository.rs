// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository behaviour over a recording connection.

use std::{collections::VecDeque, sync::Arc};

use entity_sql::{
    BlockingRepository, CompiledCommand, Connection, ConnectionInfo, DatabaseDialect,
    DefinitionRegistry, Entity, ExecuteOutcome, Filter, NO_IDENTITY, OrderBy, Pagination,
    Repository, RepositoryProvider, Result, Row, Statement, StatementCompiler,
    Value, async_trait
};
use futures::TryStreamExt;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Entity)]
#[entity(table = "Widget", rename_all = "PascalCase")]
struct Widget {
    #[id]
    #[identity]
    id:      i64,
    name:    String,
    #[revision]
    version: i64
}

#[derive(Debug, Clone, PartialEq, Entity)]
#[entity(table = "Tag")]
struct Tag {
    #[id]
    code:  String,
    label: String
}

#[derive(Serialize)]
struct NewTag {
    code:  String,
    label: String
}

/// Records every statement and answers from a script.
#[derive(Default)]
struct Recorder {
    statements: Vec<Statement>,
    rows:       VecDeque<Vec<Row>>,
    affected:   u64,
    outputs:    Vec<(String, Value)>
}

impl Recorder {
    fn answering(rows: Vec<Vec<Row>>) -> Self {
        Self {
            rows: rows.into(),
            affected: 1,
            ..Self::default()
        }
    }

    fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(Statement::sql).collect()
    }
}

#[async_trait]
impl Connection for Recorder {
    async fn execute(&mut self, statement: &Statement) -> Result<ExecuteOutcome> {
        self.statements.push(statement.clone());
        Ok(self
            .outputs
            .iter()
            .fold(ExecuteOutcome::new(self.affected), |outcome, (name, value)| {
                outcome.with_output(name.as_str(), value.clone())
            }))
    }

    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        self.statements.push(statement.clone());
        Ok(self.rows.pop_front().unwrap_or_default())
    }
}

fn provider() -> RepositoryProvider {
    RepositoryProvider::new(
        DatabaseDialect::Sqlite,
        ConnectionInfo::parse("Data Source=:memory:"),
        Arc::new(DefinitionRegistry::new())
    )
}

fn provider_for(dialect: DatabaseDialect) -> RepositoryProvider {
    RepositoryProvider::new(dialect, ConnectionInfo::default(), Arc::new(DefinitionRegistry::new()))
}

fn bolt() -> Widget {
    Widget {
        id:      0,
        name:    "bolt".into(),
        version: 0
    }
}

fn widget_row(id: i64, name: &str, version: i64) -> Row {
    Row::from_pairs([
        ("id", Value::I64(id)),
        ("name", Value::from(name)),
        ("version", Value::I64(version))
    ])
}

fn values(statement: &Statement) -> Vec<Value> {
    statement
        .parameters()
        .iter()
        .map(|p| p.value().clone())
        .collect()
}

#[tokio::test]
async fn find_all_maps_rows() {
    let mut conn = Recorder::answering(vec![vec![widget_row(1, "bolt", 3), widget_row(2, "nut", 1)]]);
    let provider = provider();
    let mut widgets: Repository<Widget, _> = provider.repository(&mut conn).unwrap();

    let found = widgets.find_all().await.unwrap();
    drop(widgets);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].name, "bolt");
    assert_eq!(found[1].version, 1);
    assert_eq!(
        conn.sql(),
        ["SELECT t0.[Id] AS [id], t0.[Name] AS [name], t0.[Version] AS [version] FROM [Widget] t0"]
    );
}

#[tokio::test]
async fn insert_returns_captured_identity_and_first_revision() {
    let mut conn = Recorder::answering(vec![vec![Row::from_pairs([("id", Value::I64(42))])]]);
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    let id = widgets
        .insert(&Widget {
            id:      0,
            name:    "bolt".into(),
            version: 0
        })
        .await
        .unwrap();
    drop(widgets);

    assert_eq!(id, Value::I64(42));
    let statement = &conn.statements[0];
    assert_eq!(
        statement.sql(),
        "INSERT INTO [Widget] ([Name], [Version]) VALUES (@p0, @p1); SELECT last_insert_rowid();"
    );
    assert_eq!(values(statement), [Value::from("bolt"), Value::I64(1)]);
}

#[tokio::test]
async fn oracle_insert_reads_identity_from_output_parameter() {
    let mut conn = Recorder {
        outputs: vec![("newid".into(), Value::I64(77))],
        ..Recorder::answering(Vec::new())
    };
    let provider = provider_for(DatabaseDialect::Oracle);
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    let id = widgets.insert(&bolt()).await.unwrap();
    drop(widgets);

    assert_eq!(id, Value::I64(77));
    assert_eq!(conn.statements.len(), 1);
    assert!(conn.sql()[0].ends_with(" RETURNING \"ID\" INTO :newid"));
    assert!(conn.statements[0].bind_by_name());
}

#[tokio::test]
async fn oracle_insert_without_output_value_yields_null() {
    let mut conn = Recorder::answering(Vec::new());
    let provider = provider_for(DatabaseDialect::Oracle);
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    assert_eq!(widgets.insert(&bolt()).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn compact_insert_reads_identity_with_second_query() {
    let mut conn = Recorder::answering(vec![vec![Row::from_pairs([("identity", Value::I64(9))])]]);
    let provider = provider_for(DatabaseDialect::SqlServerCe);
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    let id = widgets.insert(&bolt()).await.unwrap();
    drop(widgets);

    assert_eq!(id, Value::I64(9));
    let sql = conn.sql();
    assert_eq!(sql.len(), 2);
    assert!(sql[0].starts_with("INSERT INTO "));
    assert!(!sql[0].contains("@@IDENTITY"));
    assert_eq!(sql[1], "SELECT @@IDENTITY");
    assert_eq!(values(&conn.statements[0]), [Value::from("bolt"), Value::I64(1)]);
    assert!(conn.statements[1].parameters().is_empty());
}

#[tokio::test]
async fn insert_without_identity_returns_sentinel() {
    let mut conn = Recorder::answering(Vec::new());
    let provider = provider();
    let mut tags = provider.repository::<Tag, _>(&mut conn).unwrap();

    let id = tags
        .insert(&Tag {
            code:  "hw".into(),
            label: "Hardware".into()
        })
        .await
        .unwrap();
    drop(tags);

    assert_eq!(id, Value::I64(NO_IDENTITY));
    assert_eq!(conn.sql(), ["INSERT INTO [Tag] ([code], [label]) VALUES (@p0, @p1)"]);
}

#[tokio::test]
async fn update_checks_revision() {
    let mut conn = Recorder::answering(Vec::new());
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();
    let widget = Widget {
        id:      7,
        name:    "washer".into(),
        version: 3
    };

    assert_eq!(widgets.update(&widget).await.unwrap(), 1);
    drop(widgets);

    let statement = &conn.statements[0];
    assert_eq!(
        statement.sql(),
        "UPDATE [Widget] SET [Name] = @p0, [Version] = @p1 WHERE [Id] = @p2 AND [Version] = @p3"
    );
    assert_eq!(
        values(statement),
        [Value::from("washer"), Value::I64(4), Value::I64(7), Value::I64(3)]
    );
}

#[tokio::test]
async fn stale_update_is_a_concurrency_error() {
    let mut conn = Recorder::default();
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    let err = widgets
        .update(&Widget {
            id:      7,
            name:    "washer".into(),
            version: 3
        })
        .await
        .unwrap_err();

    assert!(err.is_concurrency());
    assert!(err.to_string().contains("revision 3"));
}

#[tokio::test]
async fn update_without_revision_reports_zero_rows() {
    let mut conn = Recorder::default();
    let provider = provider();
    let mut tags = provider.repository::<Tag, _>(&mut conn).unwrap();

    let affected = tags
        .update(&Tag {
            code:  "hw".into(),
            label: "Hardware".into()
        })
        .await
        .unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn find_by_key_reuses_compiled_statement() {
    let mut conn = Recorder::answering(vec![vec![widget_row(5, "gear", 2)], Vec::new()]);
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    let first = widgets.find_by_key(5_i64).await.unwrap();
    let second = widgets.find_by_key(6_i64).await.unwrap();
    drop(widgets);

    assert_eq!(first.map(|w| w.name), Some("gear".to_string()));
    assert!(second.is_none());
    assert_eq!(conn.statements[0].sql(), conn.statements[1].sql());
    assert_eq!(
        conn.statements[0].sql(),
        "SELECT [Id] AS [id], [Name] AS [name], [Version] AS [version] FROM [Widget] WHERE [Id] = @p0"
    );
    assert_eq!(values(&conn.statements[1]), [Value::I64(6)]);
}

#[tokio::test]
async fn composite_key_count_is_checked() {
    let mut conn = Recorder::default();
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    let err = widgets
        .find_by_composite_key(&[Value::I64(1), Value::I64(2)])
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
    drop(widgets);
    assert!(conn.statements.is_empty());
}

#[tokio::test]
async fn paging_appends_two_parameters() {
    let mut conn = Recorder::answering(vec![vec![widget_row(21, "cog", 1)]]);
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();
    let query = widgets
        .select()
        .filter(Filter::like("name", "c%"))
        .order_by(OrderBy::asc("name"));

    let page = widgets
        .find_page(&query, Pagination::new(20, 10))
        .await
        .unwrap();
    drop(widgets);

    assert_eq!(page.len(), 1);
    let statement = &conn.statements[0];
    assert!(statement.sql().ends_with("ORDER BY t0.[Name] ASC LIMIT @p1 OFFSET @p2"));
    assert_eq!(
        values(statement),
        [Value::from("c%"), Value::I64(10), Value::I64(20)]
    );
}

#[tokio::test]
async fn zero_take_is_rejected() {
    let mut conn = Recorder::default();
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();
    let query = widgets.select();

    let err = widgets
        .find_page(&query, Pagination::new(0, 0))
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn oracle_rejects_unaliased_star_when_paging() {
    let compiler = StatementCompiler::new(DatabaseDialect::Oracle, Arc::new(ConnectionInfo::default()));
    let command = CompiledCommand::new("SELECT * FROM \"Widget\" ORDER BY \"Name\"", Vec::new());

    let err = compiler.page(&command, 0, 10).unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn exists_reads_scalar() {
    let mut conn = Recorder::answering(vec![vec![Row::from_pairs([("e", Value::I32(1))])], Vec::new()]);
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    assert!(widgets.exists(Some(&Filter::eq("name", "bolt"))).await.unwrap());
    assert!(!widgets.exists(None).await.unwrap());
    drop(widgets);

    assert!(conn.statements[0].sql().starts_with("SELECT EXISTS(SELECT 1 FROM [Widget] WHERE "));
    assert_eq!(values(&conn.statements[0]), [Value::from("bolt")]);
}

#[tokio::test]
async fn unknown_filter_column_fails_before_execution() {
    let mut conn = Recorder::default();
    let provider = provider();
    let mut widgets = provider.repository::<Widget, _>(&mut conn).unwrap();

    let err = widgets
        .delete_where(&Filter::eq("colour", "red"))
        .await
        .unwrap_err();
    assert!(err.is_unknown_attribute());
    drop(widgets);
    assert!(conn.statements.is_empty());
}

#[tokio::test]
async fn delete_by_key() {
    let mut conn = Recorder::answering(Vec::new());
    let provider = provider();
    let mut tags = provider.repository::<Tag, _>(&mut conn).unwrap();

    assert_eq!(tags.delete_by_key(&[Value::from("hw")]).await.unwrap(), 1);
    drop(tags);
    assert_eq!(conn.sql(), ["DELETE FROM [Tag] WHERE [code] = @p0"]);
}

#[tokio::test]
async fn structured_insert_without_returning_cannot_return_rows() {
    let mut conn = Recorder::default();
    let provider = provider();
    let mut tags = provider.repository::<Tag, _>(&mut conn).unwrap();
    let builder = tags.json_insert();
    let items = [NewTag {
        code:  "hw".into(),
        label: "Hardware".into()
    }];

    let err = tags
        .insert_json_returning::<_, Tag>(&builder, &items)
        .await
        .unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn structured_insert_streams_returned_rows() {
    let returned = Row::from_pairs([("code", Value::from("hw")), ("label", Value::from("Hardware"))]);
    let mut conn = Recorder::answering(vec![vec![returned]]);
    let provider = RepositoryProvider::new(
        DatabaseDialect::PostgreSql,
        ConnectionInfo::default(),
        Arc::new(DefinitionRegistry::new())
    );
    let mut tags = provider.repository::<Tag, _>(&mut conn).unwrap();
    let builder = tags
        .json_insert()
        .on_conflict_do_nothing()
        .returning(["code", "label"]);
    let statement = builder
        .bind(&[NewTag {
            code:  "hw".into(),
            label: "Hardware".into()
        }])
        .unwrap();

    let inserted: Vec<Tag> = tags.stream(&statement).try_collect().await.unwrap();
    drop(tags);

    assert_eq!(inserted[0].label, "Hardware");
    let sql = conn.statements[0].sql();
    assert!(sql.contains("FROM jsonb_to_recordset($1::jsonb)"));
    assert!(sql.contains("ON CONFLICT DO NOTHING"));
    assert!(sql.ends_with(';'));
    assert_eq!(conn.statements[0].parameters().len(), 1);
}

#[tokio::test]
async fn structured_insert_reports_rows_affected() {
    let mut conn = Recorder::answering(Vec::new());
    let provider = RepositoryProvider::new(
        DatabaseDialect::PostgreSql,
        ConnectionInfo::default(),
        Arc::new(DefinitionRegistry::new())
    );
    let mut tags = provider.repository::<Tag, _>(&mut conn).unwrap();
    let builder = provider.json_insert::<Tag>().unwrap();
    let items = [
        NewTag {
            code:  "hw".into(),
            label: "Hardware".into()
        },
        NewTag {
            code:  "sw".into(),
            label: "Software".into()
        }
    ];

    assert_eq!(tags.insert_json(&builder, &items).await.unwrap(), 1);
    assert!(tags.insert_json(&builder, &[] as &[NewTag]).await.unwrap_err().is_invalid_argument());
}

#[test]
fn blocking_repository_mirrors_async_calls() {
    let mut conn = Recorder::answering(vec![vec![widget_row(1, "bolt", 1)]]);
    let provider = provider();
    let mut widgets = BlockingRepository::new(provider.repository::<Widget, _>(&mut conn).unwrap());

    let all = widgets.find_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(widgets.delete(&all[0]).unwrap(), 1);
    drop(widgets);

    assert_eq!(conn.sql()[1], "DELETE FROM [Widget] WHERE [Id] = @p0");
}

#[test]
fn definitions_are_registered_once() {
    let provider = provider();
    let mut first = Recorder::default();
    let mut second = Recorder::default();

    let a = provider.repository::<Widget, _>(&mut first).unwrap();
    let b = provider.repository::<Widget, _>(&mut second).unwrap();

    assert!(std::ptr::eq(a.definition(), b.definition()));
    assert_eq!(provider.definitions().len(), 1);
    assert_eq!(<Widget as Entity>::describe().unwrap().entity(), "Widget");
}
