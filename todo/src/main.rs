//! Terminal front end for the todo form.
//!
//! Reads the backend configuration and the signed-in session from the
//! environment, loads the list once, then prompts for a name and a
//! description and submits each pair. Type `:list` at any prompt to redraw
//! the form and `:quit` to exit.

use anyhow::Context;
use std::io::Write as _;
use std::time::Duration;
use todo_form::{
    AppConfig, DraftField, EnvSessionProvider, GraphQlTodoApi, TodoAction, TodoApp, config,
    require_session,
};
use todo_form_core::environment::SystemClock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOAD_TIMEOUT: Duration = Duration::from_secs(15);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

enum Input {
    Value(String),
    List,
    Quit,
}

async fn prompt<R>(lines: &mut tokio::io::Lines<R>, label: &str) -> anyhow::Result<Input>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("{label}> ");
    std::io::stdout().flush()?;

    let Some(line) = lines.next_line().await? else {
        return Ok(Input::Quit);
    };

    Ok(match line.trim() {
        ":quit" => Input::Quit,
        ":list" => Input::List,
        _ => Input::Value(line),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_form=info,todo_form_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    todo_form_runtime::metrics::describe_metrics();
    todo_form::graphql::describe_metrics();

    let config = config::install(AppConfig::from_env().context("loading configuration")?)?;

    let gate = require_session(&EnvSessionProvider::from_env(), &SystemClock).await;
    let mut app = TodoApp::mount(gate, |session| Ok(GraphQlTodoApi::new(config, session)?))
        .await
        .context("opening the todo view (is TODO_USERNAME set?)")?;

    let mut results = app.subscribe();
    tokio::spawn(async move {
        loop {
            match results.recv().await {
                Ok(TodoAction::TodoCreated { record, .. }) => {
                    println!("\nsaved: {}", record.name);
                },
                Ok(TodoAction::CreateFailed { error, .. }) => {
                    println!("\nnot saved: {error}");
                },
                Ok(_) | Err(RecvError::Lagged(_)) => {},
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Err(error) = app.wait_loaded(LOAD_TIMEOUT).await {
        tracing::warn!(%error, "List still loading; continuing with an empty list");
    }
    println!("Signed in as {}\n", app.session().username);
    println!("{}", app.render().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    'form: loop {
        for field in [DraftField::Name, DraftField::Description] {
            loop {
                match prompt(&mut lines, field.as_str()).await? {
                    Input::Quit => break 'form,
                    Input::List => println!("{}", app.render().await),
                    Input::Value(value) => {
                        app.set_field(field, value).await?;
                        break;
                    },
                }
            }
        }

        app.submit().await?;
        println!("{}", app.render().await);
    }

    if let Err(error) = app.shutdown(SHUTDOWN_TIMEOUT).await {
        tracing::warn!(%error, "Pending saves did not finish");
    }
    Ok(())
}
