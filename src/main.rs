use std::{io::Write, path::PathBuf, process::exit};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use tanuki_panel::{
    app_init::{initialize_app, AppComponents},
    config::{default_config_path, load_config},
    domain::IssueState,
    id::{PackageId, RepositoryId},
    result::{PanelError, Result},
    view::ScreenModel,
    viewmodel::{
        commits::CommitsViewModel,
        filter::{IssueSort, ProjectSort},
        issues::IssuesViewModel,
        normalize_project_path,
        packages::PackagesViewModel,
        project_details::ProjectDetailsViewModel,
        projects::ProjectsViewModel,
        registry::RegistryViewModel,
        ViewStatus,
    },
};

/// A command-line client for browsing GitLab projects, issues, commits,
/// container registries and packages
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Alternate path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the path to the configuration file and exit.
    #[arg(short, long)]
    print_config_path: bool,
    /// Alternate path to the token file.
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,
    /// Write every API response to the debug log directory.
    #[arg(long)]
    debug: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the stored personal access token
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },
    /// Test the connection and show who the token belongs to
    Status,
    /// List your projects
    Projects {
        /// Server-side search term
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Narrow the page by name or description
        #[arg(short, long)]
        filter: Option<String>,
        /// activity, name or stars
        #[arg(long, default_value = "activity")]
        sort: ProjectSort,
    },
    /// Show a project with its open issues and recent commits
    Project {
        /// Project path or URL
        path: String,
    },
    /// List the issues of a project
    Issues {
        path: String,
        /// opened, closed, locked or all
        #[arg(long, default_value = "opened")]
        state: IssueState,
        #[arg(short, long)]
        filter: Option<String>,
        /// updated, created, title or upvotes
        #[arg(long, default_value = "updated")]
        sort: IssueSort,
    },
    /// Search issues across all projects
    SearchIssues { term: String },
    /// List the commits of a project
    Commits {
        path: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Branch or tag
        #[arg(long = "ref")]
        ref_name: Option<String>,
        /// Only commits after this time (RFC 3339)
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Only commits before this time (RFC 3339)
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
    /// Browse the container registry of a project
    Registry {
        path: String,
        /// Repository whose tags to list
        #[arg(short, long)]
        repository: Option<RepositoryId>,
        /// Delete this tag from the repository
        #[arg(long, requires = "repository")]
        delete_tag: Option<String>,
        /// Describe this tag of the repository
        #[arg(long, requires = "repository")]
        logs: Option<String>,
    },
    /// Browse and transfer packages of a project
    Packages {
        path: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[command(subcommand)]
        action: Option<PackageCommand>,
    },
    /// Open a project in the browser
    Open { path: String },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Save a personal access token
    Save { token: String },
    /// Show where the token is stored and when it was saved
    Show,
}

#[derive(Subcommand, Debug)]
enum PackageCommand {
    /// List the files of a package
    Files { package: PackageId },
    /// Download a file of a generic package
    Download {
        package: PackageId,
        file: String,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Upload a file into a generic package
    Upload {
        name: String,
        version: String,
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(default_config_path);

    if args.print_config_path {
        println!("{}", config_path.display());
        exit(0);
    }

    let debug = args.debug || std::env::var("TANUKI_DEBUG").is_ok();
    let config = load_config(&config_path)?;

    let components = initialize_app(config, args.credentials, debug)?;

    // Create a shared runtime for async operations
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        PanelError::GeneralError(format!("Failed to create runtime: {e}").into())
    })?;

    let command = args.command.unwrap_or(Command::Status);
    let succeeded = rt.block_on(run(command, &components))?;
    if !succeeded {
        exit(1);
    }

    Ok(())
}

/// Runs one command; `false` when the view ended in an error state
async fn run(command: Command, app: &AppComponents) -> Result<bool> {
    let per_page = app.config.per_page;

    match command {
        Command::Token { action: TokenCommand::Save { token } } => {
            let mut vm = app.settings();
            vm.save_token(&token);
            render(app, ScreenModel::Settings(&vm), vm.status())
        },
        Command::Token { action: TokenCommand::Show } => {
            let vm = app.settings();
            render(app, ScreenModel::Settings(&vm), vm.status())
        },
        Command::Status => {
            let mut vm = app.settings();
            vm.test_connection().await;
            render(app, ScreenModel::Settings(&vm), vm.status())
        },
        Command::Projects { search, page, filter, sort } => {
            let mut vm = ProjectsViewModel::new(app.api()?, per_page);
            match search {
                Some(term) => vm.search_page(&term, page).await,
                None => vm.go_to_page(page).await,
            }
            vm.set_filter(filter.as_deref().unwrap_or_default());
            vm.set_sort(sort);
            render(app, ScreenModel::Projects(&vm), vm.status())
        },
        Command::Project { path } => {
            let mut vm = ProjectDetailsViewModel::new(app.api()?);
            vm.load(&path).await;
            render(app, ScreenModel::ProjectDetails(&vm), vm.status())
        },
        Command::Issues { path, state, filter, sort } => {
            let mut vm = IssuesViewModel::new(app.api()?);
            vm.set_state(state).await;
            vm.open_project(&path).await;
            vm.set_filter(filter.as_deref().unwrap_or_default());
            vm.set_sort(sort);
            render(app, ScreenModel::Issues(&vm), vm.status())
        },
        Command::SearchIssues { term } => {
            let mut vm = IssuesViewModel::new(app.api()?);
            vm.search(&term).await;
            render(app, ScreenModel::Issues(&vm), vm.status())
        },
        Command::Commits { path, page, ref_name, since, until } => {
            let mut vm = CommitsViewModel::new(app.api()?, per_page);
            vm.set_ref_name(ref_name.as_deref());
            if since.is_some() || until.is_some() {
                let until = until.unwrap_or_else(Utc::now);
                let since = since.unwrap_or_default();
                vm.set_date_range(since, until);
                vm.set_date_filter(true);
            }
            vm.open_project(&path).await;
            if page > 1 && vm.project().is_some() {
                vm.go_to_page(page).await;
            }
            render(app, ScreenModel::Commits(&vm), vm.status())
        },
        Command::Registry { path, repository, delete_tag, logs } => {
            let mut vm = RegistryViewModel::new(app.api()?);
            vm.open_project(&path).await;
            if let Some(repository_id) = repository.filter(|_| vm.project().is_some()) {
                vm.select_repository(repository_id).await;
                if let Some(tag) = delete_tag {
                    vm.delete_tag(&tag).await;
                }
            }

            let succeeded = render(app, ScreenModel::Registry(&vm), vm.status())?;
            if let Some(text) = logs.and_then(|tag| vm.tag_logs(&tag)) {
                println!("\n{text}");
            }
            Ok(succeeded)
        },
        Command::Packages { path, page, action } => {
            let mut vm = PackagesViewModel::new(app.api()?, per_page);
            vm.open_project(&path).await;
            if page > 1 && vm.project().is_some() {
                vm.go_to_page(page).await;
            }

            match action {
                Some(PackageCommand::Files { package }) => vm.select_package(package).await,
                Some(PackageCommand::Download { package, file, output }) => {
                    vm.select_package(package).await;
                    let destination = output.unwrap_or_else(|| PathBuf::from(&file));
                    vm.download(&file, &destination).await;
                },
                Some(PackageCommand::Upload { name, version, file }) => {
                    vm.upload(&name, &version, &file).await;
                },
                None => {},
            }
            render(app, ScreenModel::Packages(&vm), vm.status())
        },
        Command::Open { path } => {
            let project_path = normalize_project_path(&path).ok_or_else(|| {
                PanelError::GeneralError("Enter a project path such as group/project".into())
            })?;
            let project = app.api()?.get_project_by_path(&project_path).await?;
            open::that(project.web_url.as_str())?;
            Ok(true)
        },
    }
}

fn render(app: &AppComponents, model: ScreenModel<'_>, status: &ViewStatus) -> Result<bool> {
    let mut stdout = std::io::stdout().lock();
    app.views.render(&model, &mut stdout)?;
    stdout.flush()?;

    Ok(!status.is_error())
}
