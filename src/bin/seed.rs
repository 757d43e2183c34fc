//! Populates a development database with demo accounts and tasks.
//!
//! Safe to run repeatedly: existing accounts are reused, and users who already
//! own tasks get no new ones.

use std::error::Error;
use std::sync::Arc;

use chrono::{Duration, Utc};
use env_logger::Env;
use log::info;

use taskmanager::auth::Identity;
use taskmanager::models::{Role, TaskInput, TaskPriority, TaskQuery, TaskStatus};
use taskmanager::services::{AccountService, TaskService};
use taskmanager::{db, store::PgStore, Config};

const DEMO_USERS: [(&str, &str); 2] = [("user1", "user123"), ("user2", "user456")];

fn sample_tasks(username: &str) -> Vec<TaskInput> {
    let now = Utc::now();
    vec![
        TaskInput {
            title: format!("Plan the week ({})", username),
            description: Some("Outline goals and deadlines for the coming days".to_string()),
            status: Some(TaskStatus::Created),
            priority: Some(TaskPriority::High),
            deadline: Some(now + Duration::days(2)),
        },
        TaskInput {
            title: format!("Review open pull requests ({})", username),
            description: None,
            status: Some(TaskStatus::InProgress),
            priority: Some(TaskPriority::Medium),
            deadline: Some(now - Duration::days(1)),
        },
        TaskInput {
            title: format!("Archive old notes ({})", username),
            description: Some("Move finished items out of the inbox".to_string()),
            status: Some(TaskStatus::Completed),
            priority: Some(TaskPriority::Low),
            deadline: None,
        },
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let accounts = AccountService::new(store.clone(), config.bcrypt_cost);
    let tasks = TaskService::new(store);

    let mut users = vec![accounts.ensure_admin(&config.admin).await?];
    for (username, password) in DEMO_USERS {
        users.push(accounts.provision(username, password, Role::User).await?);
    }

    for user in &users {
        let identity = Identity::from(user);
        // Scoped as a regular user so the admin counts only its own tasks.
        let owned = Identity {
            role: Role::User,
            ..identity.clone()
        };
        let existing = tasks.list(&owned, &TaskQuery::default()).await?;
        if existing.is_empty() {
            for input in sample_tasks(&user.username) {
                tasks.create(&identity, input).await?;
            }
        }
        let count = tasks.list(&owned, &TaskQuery::default()).await?.len();
        info!("{} ({:?}) owns {} task(s)", user.username, user.role, count);
    }

    let stats = tasks.statistics().await?;
    info!("Statistics: {}", serde_json::to_string(&stats)?);
    for (username, password) in DEMO_USERS {
        info!("Login with {} / {}", username, password);
    }
    Ok(())
}
