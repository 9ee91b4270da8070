use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcloud_gax::grpc::{Code, Status};
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig, Error as ClientError};
use gcloud_spanner::mutation::insert;
use gcloud_spanner::row::Row;
use gcloud_spanner::statement::Statement;
use gcloud_spanner::value::CommitTimestamp;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SpannerSettings;
use crate::models::{Coordinate, NewRoute, NewUser, Route, User};
use crate::store::{Store, StoreError, StoreResult};

const USERS_TABLE: &str = "users";
const ROUTES_TABLE: &str = "routes";
const USERS_EMAIL_INDEX: &str = "users_by_email";

/// Schema objects the service needs, as (name, DDL) pairs
const SCHEMA: [(&str, &str); 3] = [
    (
        USERS_TABLE,
        r#"CREATE TABLE users (
    id STRING(36) NOT NULL,
    email STRING(MAX) NOT NULL,
    password_hash STRING(MAX) NOT NULL,
    created_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (id)"#,
    ),
    (
        USERS_EMAIL_INDEX,
        "CREATE UNIQUE INDEX users_by_email ON users (email)",
    ),
    (
        ROUTES_TABLE,
        r#"CREATE TABLE routes (
    id STRING(36) NOT NULL,
    coordinates STRING(MAX) NOT NULL,
    comment STRING(MAX) NOT NULL,
    created_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (id)"#,
    ),
];

/// Shareable Spanner client for use across async handlers
#[derive(Clone)]
pub struct SpannerClient {
    inner: Arc<Client>,
}

impl SpannerClient {
    /// Connect to the configured database, provisioning it first if needed
    ///
    /// The gcloud-spanner library detects the SPANNER_EMULATOR_HOST
    /// environment variable and connects to the emulator when set, or
    /// production Spanner otherwise.
    pub async fn from_settings(settings: &SpannerSettings) -> Result<Self> {
        auto_provision(settings).await?;

        let database_path = settings.database_path();

        match &settings.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {}",
            database_path
        );

        Ok(Self {
            inner: Arc::new(client),
        })
    }

    /// Run a read-only query in a single-use transaction and map every row
    async fn query_rows<T>(
        &self,
        statement: Statement,
        map: fn(&Row) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query Spanner")?;

        let mut rows = Vec::new();
        while let Some(row) = result_set.next().await.context("Failed to read result row")? {
            rows.push(map(&row)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl Store for SpannerClient {
    async fn sample_users(&self, limit: usize) -> StoreResult<Vec<User>> {
        let statement = Statement::new(format!(
            "SELECT id, email, password_hash, created_at FROM users LIMIT {}",
            limit
        ));

        let users = self.query_rows(statement, user_from_row)
            .await
            .context("Failed to sample users")?;

        tracing::debug!("Sampled {} users", users.len());
        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut statement = Statement::new(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = @email LIMIT 1",
        );
        statement.add_param("email", &email.to_string());

        let user = self.query_rows(statement, user_from_row)
            .await
            .context("Failed to look up user by email")?
            .into_iter()
            .next();

        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mutation = insert(
            USERS_TABLE,
            &["id", "email", "password_hash", "created_at"],
            &[&id_str, &user.email, &user.password_hash, &CommitTimestamp::new()],
        );

        let commit = self.inner
            .apply(vec![mutation])
            .await
            .map_err(|err| map_write_error(err, "Failed to insert user"))?;

        // The row is committed from here on; created_at is its commit timestamp
        let created_at = commit_timestamp(commit.timestamp.as_ref().map(|t| (t.seconds, t.nanos)))?;

        tracing::debug!("Inserted user with id: {}", id);
        Ok(User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            created_at,
        })
    }

    async fn insert_route(&self, route: NewRoute) -> StoreResult<Route> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let coordinates_str = serde_json::to_string(&route.coordinates)
            .context("Failed to serialize route coordinates")?;

        let mutation = insert(
            ROUTES_TABLE,
            &["id", "coordinates", "comment", "created_at"],
            &[&id_str, &coordinates_str, &route.comment, &CommitTimestamp::new()],
        );

        let commit = self.inner
            .apply(vec![mutation])
            .await
            .map_err(|err| map_write_error(err, "Failed to insert route"))?;

        // The row is committed from here on; created_at is its commit timestamp
        let created_at = commit_timestamp(commit.timestamp.as_ref().map(|t| (t.seconds, t.nanos)))?;

        tracing::debug!("Inserted route with id: {}", id);
        Ok(Route {
            id,
            coordinates: route.coordinates,
            comment: route.comment,
            created_at,
        })
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let statement = Statement::new(
            "SELECT id, coordinates, comment, created_at FROM routes ORDER BY created_at DESC, id DESC",
        );

        let routes = self.query_rows(statement, route_from_row)
            .await
            .context("Failed to list routes")?;

        tracing::debug!("Listed {} routes", routes.len());
        Ok(routes)
    }
}

/// Unique index violations surface as ALREADY_EXISTS
fn map_write_error(err: ClientError, what: &'static str) -> StoreError {
    match err {
        ClientError::GRPC(status) if status.code() == Code::AlreadyExists => StoreError::Duplicate,
        other => StoreError::Backend(anyhow::Error::new(other).context(what)),
    }
}

/// Convert a commit timestamp's (seconds, nanos) into a UTC time
fn commit_timestamp(parts: Option<(i64, i32)>) -> Result<DateTime<Utc>> {
    let (seconds, nanos) = parts.context("Commit result carried no timestamp")?;
    let nanos = u32::try_from(nanos).context("Commit timestamp has negative nanos")?;
    DateTime::from_timestamp(seconds, nanos).context("Commit timestamp out of range")
}

fn parse_timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>> {
    // Timestamps arrive as RFC 3339 strings
    let raw: String = row.column_by_name(column)?;
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .with_context(|| format!("Failed to parse {} timestamp", column))?;
    Ok(parsed.with_timezone(&Utc))
}

fn parse_id(row: &Row) -> Result<Uuid> {
    let raw: String = row.column_by_name("id")?;
    Uuid::parse_str(&raw).with_context(|| format!("Stored id is not a UUID: {}", raw))
}

fn user_from_row(row: &Row) -> Result<User> {
    Ok(User {
        id: parse_id(row)?,
        email: row.column_by_name("email")?,
        password_hash: row.column_by_name("password_hash")?,
        created_at: parse_timestamp(row, "created_at")?,
    })
}

fn route_from_row(row: &Row) -> Result<Route> {
    let coordinates_str: String = row.column_by_name("coordinates")?;
    let coordinates: Vec<Coordinate> = serde_json::from_str(&coordinates_str)
        .context("Failed to deserialize route coordinates")?;

    Ok(Route {
        id: parse_id(row)?,
        coordinates,
        comment: row.column_by_name("comment")?,
        created_at: parse_timestamp(row, "created_at")?,
    })
}

/// Automatically provision Spanner instance, database, tables and index
///
/// Checks whether the configured resources exist and creates them if needed,
/// so a fresh emulator works with zero setup.
async fn auto_provision(settings: &SpannerSettings) -> Result<()> {
    tracing::info!("Starting auto-provisioning checks...");

    let admin_client = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Failed to create Spanner admin client")?;

    let project_path = format!("projects/{}", settings.project);
    let instance_path = format!("{}/instances/{}", project_path, settings.instance);
    let database_path = settings.database_path();

    ensure_instance_exists(&admin_client, settings, &project_path, &instance_path).await?;
    ensure_database_exists(&admin_client, &instance_path, &database_path).await?;
    ensure_schema_exists(&admin_client, &database_path).await?;

    tracing::info!("Auto-provisioning complete");
    Ok(())
}

/// Look a resource up and create it only when the lookup says NOT_FOUND
async fn ensure_exists<T, Create, CreateFut>(
    kind: &str,
    path: &str,
    lookup: impl Future<Output = std::result::Result<T, Status>>,
    create: Create,
) -> Result<()>
where
    Create: FnOnce() -> CreateFut,
    CreateFut: Future<Output = Result<()>>,
{
    match lookup.await {
        Ok(_) => {
            tracing::info!("{} already exists: {}", kind, path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("{} not found, creating: {}", kind, path);
            create().await?;
            tracing::info!("{} created: {}", kind, path);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Failed to check {} existence: {}",
            kind,
            e.message()
        )),
    }
}

async fn ensure_instance_exists(
    admin_client: &AdminClient,
    settings: &SpannerSettings,
    project_path: &str,
    instance_path: &str,
) -> Result<()> {
    let lookup = admin_client.instance().get_instance(
        GetInstanceRequest {
            name: instance_path.to_string(),
            field_mask: None,
        },
        None,
    );

    ensure_exists("instance", instance_path, lookup, || async move {
        let config_name = if settings.emulator_host.is_some() {
            "emulator-config"
        } else {
            "regional-us-central1"
        };

        let request = CreateInstanceRequest {
            parent: project_path.to_string(),
            instance_id: settings.instance.clone(),
            instance: Some(Instance {
                name: instance_path.to_string(),
                config: format!("{}/instanceConfigs/{}", project_path, config_name),
                display_name: format!("{} instance", settings.instance),
                node_count: 1,
                ..Default::default()
            }),
        };

        admin_client
            .instance()
            .create_instance(request, None)
            .await
            .context("Failed to start instance creation")?
            .wait(None)
            .await
            .context("Failed to create instance")?;
        Ok::<(), anyhow::Error>(())
    })
    .await
}

async fn ensure_database_exists(
    admin_client: &AdminClient,
    instance_path: &str,
    database_path: &str,
) -> Result<()> {
    let lookup = admin_client.database().get_database(
        GetDatabaseRequest {
            name: database_path.to_string(),
        },
        None,
    );

    ensure_exists("database", database_path, lookup, || async move {
        let database_id = database_path
            .rsplit('/')
            .next()
            .context("Invalid database path")?;

        let request = CreateDatabaseRequest {
            parent: instance_path.to_string(),
            create_statement: format!("CREATE DATABASE `{}`", database_id),
            extra_statements: vec![],
            encryption_config: None,
            database_dialect: 1, // Google Standard SQL
            proto_descriptors: vec![],
        };

        admin_client
            .database()
            .create_database(request, None)
            .await
            .context("Failed to start database creation")?
            .wait(None)
            .await
            .context("Failed to create database")?;
        Ok::<(), anyhow::Error>(())
    })
    .await
}

/// DDL statements from `SCHEMA` whose object is not in `existing`
fn missing_schema(existing: &[String]) -> Vec<String> {
    SCHEMA
        .iter()
        .filter(|(name, _)| {
            !existing.iter().any(|stmt| {
                stmt.contains(&format!("TABLE {} ", name))
                    || stmt.contains(&format!("TABLE `{}`", name))
                    || stmt.contains(&format!("INDEX {} ", name))
                    || stmt.contains(&format!("INDEX `{}`", name))
            })
        })
        .map(|(_, ddl)| ddl.to_string())
        .collect()
}

async fn ensure_schema_exists(admin_client: &AdminClient, database_path: &str) -> Result<()> {
    let get_ddl_request = GetDatabaseDdlRequest {
        database: database_path.to_string(),
    };

    let ddl_response = admin_client
        .database()
        .get_database_ddl(get_ddl_request, None)
        .await
        .context("Failed to get database DDL")?;

    let statements = missing_schema(&ddl_response.into_inner().statements);
    if statements.is_empty() {
        tracing::info!("Tables 'users' and 'routes' already exist");
        return Ok(());
    }

    tracing::info!("Applying {} schema statement(s)...", statements.len());

    let update_request = UpdateDatabaseDdlRequest {
        database: database_path.to_string(),
        statements,
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };

    let mut operation = admin_client
        .database()
        .update_database_ddl(update_request, None)
        .await
        .context("Failed to start schema creation")?;

    operation
        .wait(None)
        .await
        .context("Failed to create schema")?;

    tracing::info!("Schema created successfully");
    Ok(())
}
