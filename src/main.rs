use std::{future::IntoFuture, process, sync::Arc};

use apalis::prelude::{Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use tipbot::{
    application::{
        catalog::CatalogService,
        error::AppError,
        jobs::{DailyPostContext, daily_post_schedule, process_daily_post_job},
        repos::{CategoriesRepo, HealthRepo, HistoryRepo, SeedRepo, TipsRepo, TipsWriteRepo},
        rotation::{RotationOutcome, RotationService},
        seed::{SeedCatalog, SeedService},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        generator::build_generator,
        http::{self, ApiState},
        publisher::build_publisher,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Post(_) => run_post(settings).await,
        config::Command::Seed(_) => run_seed(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let rotation = build_rotation_service(repositories.clone(), &settings)?;
    let catalog = build_catalog_service(repositories.clone());

    let monitor_handle = if settings.schedule.enabled {
        Some(spawn_job_monitor(rotation.clone(), &settings.schedule)?)
    } else {
        info!("daily posting schedule disabled");
        None
    };

    let api_state = ApiState {
        catalog,
        rotation,
        health: repositories as Arc<dyn HealthRepo>,
    };
    let result = serve_http(&settings, api_state).await;

    if let Some(handle) = monitor_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_post(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let rotation = build_rotation_service(repositories, &settings)?;

    let outcome = rotation.run_daily_cycle().await?;

    match outcome {
        RotationOutcome::NothingToPost {
            category_id,
            reason,
        } => {
            info!(category_id, reason = reason.as_str(), "No tips available");
        }
        RotationOutcome::Attempted(report) if report.posted => {
            info!(
                category_id = report.category_id,
                tip_id = report.tip.id,
                external_id = report.external_id.as_deref().unwrap_or(""),
                replenished = report.replacement.is_some(),
                "Tip posted successfully"
            );
        }
        RotationOutcome::Attempted(report) => {
            warn!(
                category_id = report.category_id,
                tip_id = report.tip.id,
                replenished = report.replacement.is_some(),
                "Failed to post tip"
            );
        }
    }

    Ok(())
}

async fn run_seed(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let catalog = SeedCatalog::bundled()?;

    let summary = SeedService::new(repositories as Arc<dyn SeedRepo>)
        .apply(&catalog)
        .await?;

    info!(
        categories_created = summary.categories_created,
        tips_created = summary.tips_created,
        "seed complete"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await?;
    PostgresRepositories::run_migrations(&pool).await?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_rotation_service(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<Arc<RotationService>, AppError> {
    let publisher = build_publisher(&settings.publisher, &settings.rotation.platform)?;
    let generator = build_generator(&settings.generator)?;

    info!(
        publisher = ?settings.publisher.mode,
        generator = ?settings.generator.mode,
        timezone = %settings.rotation.timezone,
        "rotation configured"
    );

    Ok(Arc::new(RotationService::new(
        repositories.clone() as Arc<dyn TipsRepo>,
        repositories.clone() as Arc<dyn TipsWriteRepo>,
        repositories as Arc<dyn CategoriesRepo>,
        publisher,
        generator,
        settings.rotation.timezone,
    )))
}

fn build_catalog_service(repositories: Arc<PostgresRepositories>) -> Arc<CatalogService> {
    Arc::new(CatalogService::new(
        repositories.clone() as Arc<dyn CategoriesRepo>,
        repositories.clone() as Arc<dyn TipsRepo>,
        repositories.clone() as Arc<dyn TipsWriteRepo>,
        repositories as Arc<dyn HistoryRepo>,
    ))
}

fn spawn_job_monitor(
    rotation: Arc<RotationService>,
    schedule: &config::ScheduleSettings,
) -> Result<tokio::task::JoinHandle<()>, AppError> {
    let cron = daily_post_schedule(&schedule.cron)
        .map_err(|reason| AppError::validation(format!("schedule.cron: {reason}")))?;

    let daily_post_worker = WorkerBuilder::new("daily-post-worker")
        .data(DailyPostContext { rotation })
        .backend(CronStream::new(cron))
        .build_fn(process_daily_post_job);

    let monitor = Monitor::new().register(daily_post_worker);
    info!(cron = %schedule.cron, "daily posting schedule registered");

    Ok(tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    }))
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "http listener ready");

    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signal_tx.send(());
            })
            .into_future(),
    );

    tokio::select! {
        joined = &mut server => return server_result(joined),
        _ = signal_rx => {
            info!(grace = ?settings.server.graceful_shutdown, "shutdown requested; draining connections");
        }
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
        Ok(joined) => server_result(joined),
        Err(_) => {
            warn!("graceful shutdown timed out; closing remaining connections");
            server.abort();
            Ok(())
        }
    }
}

fn server_result(
    joined: Result<Result<(), std::io::Error>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
