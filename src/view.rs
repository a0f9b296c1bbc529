//! Plain-text rendering of view-model state
//!
//! Renderers are registered per [`Screen`] when the registry is built; there
//! is no lookup by naming convention.

use std::{collections::HashMap, io};

use itertools::Itertools;

use crate::viewmodel::{
    commits::CommitsViewModel, issues::IssuesViewModel, packages::PackagesViewModel,
    project_details::ProjectDetailsViewModel, projects::ProjectsViewModel,
    registry::RegistryViewModel, settings::SettingsViewModel, LoadState, ViewStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Projects,
    ProjectDetails,
    Issues,
    Commits,
    Registry,
    Packages,
    Settings,
}

/// A view-model borrowed for rendering
pub enum ScreenModel<'a> {
    Projects(&'a ProjectsViewModel),
    ProjectDetails(&'a ProjectDetailsViewModel),
    Issues(&'a IssuesViewModel),
    Commits(&'a CommitsViewModel),
    Registry(&'a RegistryViewModel),
    Packages(&'a PackagesViewModel),
    Settings(&'a SettingsViewModel),
}

impl ScreenModel<'_> {
    pub fn screen(&self) -> Screen {
        match self {
            ScreenModel::Projects(_) => Screen::Projects,
            ScreenModel::ProjectDetails(_) => Screen::ProjectDetails,
            ScreenModel::Issues(_) => Screen::Issues,
            ScreenModel::Commits(_) => Screen::Commits,
            ScreenModel::Registry(_) => Screen::Registry,
            ScreenModel::Packages(_) => Screen::Packages,
            ScreenModel::Settings(_) => Screen::Settings,
        }
    }
}

pub type Renderer = fn(&ScreenModel<'_>, &mut dyn io::Write) -> io::Result<()>;

pub struct ViewRegistry {
    renderers: HashMap<Screen, Renderer>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self { renderers: HashMap::new() }
    }

    /// Registry with a text renderer for every screen
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Screen::Projects, render_projects);
        registry.register(Screen::ProjectDetails, render_project_details);
        registry.register(Screen::Issues, render_issues);
        registry.register(Screen::Commits, render_commits);
        registry.register(Screen::Registry, render_registry);
        registry.register(Screen::Packages, render_packages);
        registry.register(Screen::Settings, render_settings);
        registry
    }

    pub fn register(&mut self, screen: Screen, renderer: Renderer) {
        self.renderers.insert(screen, renderer);
    }

    pub fn render(&self, model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
        let screen = model.screen();
        let renderer = self.renderers.get(&screen).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no view registered for {screen:?}"))
        })?;

        renderer(model, out)
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn render_status(status: &ViewStatus, out: &mut dyn io::Write) -> io::Result<()> {
    match status.state {
        LoadState::Idle => Ok(()),
        LoadState::Error => writeln!(out, "error: {}", status.message),
        _ => writeln!(out, "{}", status.message),
    }
}

fn render_pages(
    page: u32,
    has_previous: bool,
    has_next: bool,
    out: &mut dyn io::Write,
) -> io::Result<()> {
    let prev = if has_previous { "< prev" } else { "" };
    let next = if has_next { "next >" } else { "" };
    writeln!(out, "page {page} {prev} {next}")
}

fn render_projects(model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let ScreenModel::Projects(vm) = model else {
        return Ok(());
    };

    render_status(vm.status(), out)?;
    for project in vm.visible() {
        writeln!(
            out,
            "{:<8} {:<40} {:>5}* {:<8} {}",
            project.id,
            project.path_with_namespace,
            project.star_count,
            project.visibility.as_str(),
            project.last_activity_at.format("%Y-%m-%d"),
        )?;
    }

    let pager = vm.pager();
    render_pages(pager.page(), pager.has_previous_page(), pager.has_next_page(), out)
}

fn render_project_details(model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let ScreenModel::ProjectDetails(vm) = model else {
        return Ok(());
    };

    render_status(vm.status(), out)?;
    let Some(project) = vm.project() else {
        return Ok(());
    };

    writeln!(out, "{} ({})", project.name, project.path_with_namespace)?;
    if !project.description.is_empty() {
        writeln!(out, "{}", project.description)?;
    }
    writeln!(
        out,
        "{} stars, {} forks, {} open issues, default branch {}",
        project.star_count, project.forks_count, project.open_issues_count, project.default_branch
    )?;
    writeln!(out, "{}", project.web_url)?;

    writeln!(out, "\nopen issues:")?;
    for issue in vm.open_issues() {
        writeln!(out, "  #{:<6} {}", issue.iid, issue.title)?;
    }

    writeln!(out, "\nrecent commits:")?;
    for commit in vm.recent_commits() {
        writeln!(out, "  {} {:<24} {}", commit.short_id, commit.author_name, commit.title)?;
    }

    Ok(())
}

fn render_issues(model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let ScreenModel::Issues(vm) = model else {
        return Ok(());
    };

    render_status(vm.status(), out)?;
    for issue in vm.visible() {
        let labels = issue.labels.iter().join(", ");
        writeln!(
            out,
            "#{:<6} {:<7} {:<50} {:<20} {}",
            issue.iid,
            issue.state.as_str(),
            issue.title,
            issue.author_name(),
            labels,
        )?;
    }

    Ok(())
}

fn render_commits(model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let ScreenModel::Commits(vm) = model else {
        return Ok(());
    };

    render_status(vm.status(), out)?;
    for commit in vm.commits() {
        writeln!(
            out,
            "{} {} {:<24} {}",
            commit.short_id,
            commit.created_at.format("%Y-%m-%d %H:%M"),
            commit.author_name,
            commit.title,
        )?;
    }

    let pager = vm.pager();
    render_pages(pager.page(), pager.has_previous_page(), pager.has_next_page(), out)
}

fn render_registry(model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let ScreenModel::Registry(vm) = model else {
        return Ok(());
    };

    render_status(vm.status(), out)?;
    let selected = vm.selected_repository().map(|r| r.id);
    for repository in vm.repositories() {
        let marker = if Some(repository.id) == selected { ">" } else { " " };
        writeln!(
            out,
            "{marker} {:<6} {:<50} {} tags",
            repository.id, repository.location, repository.tags_count
        )?;
    }

    for tag in vm.tags() {
        writeln!(
            out,
            "    {:<30} {:<10} {:>12} {}",
            tag.name,
            tag.short_revision,
            format_size(tag.total_size),
            tag.created_at.format("%Y-%m-%d"),
        )?;
    }

    Ok(())
}

fn render_packages(model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let ScreenModel::Packages(vm) = model else {
        return Ok(());
    };

    render_status(vm.status(), out)?;
    let selected = vm.selected_package().map(|p| p.id);
    for package in vm.packages() {
        let marker = if Some(package.id) == selected { ">" } else { " " };
        writeln!(
            out,
            "{marker} {:<6} {:<30} {:<12} {}",
            package.id, package.name, package.version, package.package_type
        )?;
    }

    for file in vm.files() {
        writeln!(out, "    {:<40} {:>12}", file.file_name, format_size(file.size))?;
    }

    let pager = vm.pager();
    render_pages(pager.page(), pager.has_previous_page(), pager.has_next_page(), out)
}

fn render_settings(model: &ScreenModel<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let ScreenModel::Settings(vm) = model else {
        return Ok(());
    };

    render_status(vm.status(), out)?;
    writeln!(out, "token file: {}", vm.store().path().display())?;
    match vm.credential() {
        Some(credential) => writeln!(
            out,
            "token: {} (saved {})",
            mask_token(&credential.token),
            credential.saved_at.format("%Y-%m-%d %H:%M UTC")
        )?,
        None => writeln!(out, "token: not saved")?,
    }

    if let Some(user) = vm.current_user() {
        writeln!(out, "user: {user}")?;
    }

    Ok(())
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}{}", "*".repeat(token.chars().count().saturating_sub(4)))
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
