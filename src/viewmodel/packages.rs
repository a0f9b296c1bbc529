use std::{path::Path, sync::Arc};

use compact_str::format_compact;

use super::{resolve_project, Pager, ViewStatus};
use crate::{
    client::{CancelFlag, GitlabApi, TransferOutcome},
    domain::{Package, PackageFile, Project},
    id::PackageId,
};

/// Package registry browser with generic package transfers
pub struct PackagesViewModel {
    api: Arc<GitlabApi>,
    project: Option<Project>,
    packages: Vec<Package>,
    pager: Pager,
    selected: Option<PackageId>,
    files: Vec<PackageFile>,
    cancel: CancelFlag,
    status: ViewStatus,
}

impl PackagesViewModel {
    pub fn new(api: Arc<GitlabApi>, per_page: u32) -> Self {
        Self {
            api,
            project: None,
            packages: Vec::new(),
            pager: Pager::new(per_page),
            selected: None,
            files: Vec::new(),
            cancel: CancelFlag::new(),
            status: ViewStatus::default(),
        }
    }

    pub async fn open_project(&mut self, input: &str) {
        self.packages.clear();
        self.files.clear();
        self.selected = None;
        self.pager.reset();
        self.project = resolve_project(&self.api, input, &mut self.status).await;
        if self.project.is_some() {
            self.load().await;
        }
    }

    pub async fn load(&mut self) {
        let Some(project) = &self.project else {
            self.status.failed("Open a project first");
            return;
        };

        let project_id = project.id;
        let (page, per_page) = (self.pager.page(), self.pager.per_page());
        self.status.loading(format_compact!("Loading packages, page {page}"));

        match self.api.list_packages(project_id, page, per_page).await {
            Ok(packages) => {
                self.pager.record(packages.len());
                self.packages = packages;
                self.status
                    .loaded(format_compact!("{} packages on page {page}", self.packages.len()));
            },
            Err(e) => {
                self.pager.record(0);
                self.packages.clear();
                self.status.client_failed("Loading packages", &e);
            },
        }
    }

    /// Loads `page` directly
    pub async fn go_to_page(&mut self, page: u32) {
        self.pager.set_page(page);
        self.load().await;
    }

    pub async fn next_page(&mut self) -> bool {
        let moved = self.project.is_some() && self.pager.next();
        if moved {
            self.load().await;
        }
        moved
    }

    pub async fn previous_page(&mut self) -> bool {
        let moved = self.project.is_some() && self.pager.previous();
        if moved {
            self.load().await;
        }
        moved
    }

    /// Selects a package on the current page and lists its files
    pub async fn select_package(&mut self, package_id: PackageId) {
        let Some(project) = &self.project else {
            self.status.failed("Open a project first");
            return;
        };
        if !self.packages.iter().any(|p| p.id == package_id) {
            self.status.failed(format_compact!("No package {package_id} on this page"));
            return;
        }

        let project_id = project.id;
        self.selected = Some(package_id);
        self.files.clear();
        match self.api.list_package_files(project_id, package_id).await {
            Ok(files) => {
                self.files = files;
                self.status.loaded(format_compact!("{} files", self.files.len()));
            },
            Err(e) => self.status.client_failed("Loading package files", &e),
        }
    }

    /// Downloads a file of the selected package to `destination`
    pub async fn download(
        &mut self,
        file_name: &str,
        destination: &Path,
    ) -> Option<TransferOutcome> {
        let Some(project_id) = self.project.as_ref().map(|p| p.id) else {
            self.status.failed("Open a project first");
            return None;
        };
        let Some(package) = self.selected_package().cloned() else {
            self.status.failed("Select a package first");
            return None;
        };

        self.status.loading(format_compact!("Downloading {file_name}"));
        let result = self
            .api
            .download_generic_package_file(
                project_id,
                &package,
                file_name,
                destination,
                &self.cancel,
            )
            .await;

        self.finish_transfer(file_name, result)
    }

    /// Uploads `source` into the generic package `name`/`version` of the open
    /// project
    pub async fn upload(
        &mut self,
        name: &str,
        version: &str,
        source: &Path,
    ) -> Option<TransferOutcome> {
        let Some(project_id) = self.project.as_ref().map(|p| p.id) else {
            self.status.failed("Open a project first");
            return None;
        };
        if name.trim().is_empty() || version.trim().is_empty() {
            self.status.failed("Package name and version are required");
            return None;
        }

        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        self.status.loading(format_compact!("Uploading {file_name}"));
        let result = self
            .api
            .upload_generic_package_file(
                project_id,
                name.trim(),
                version.trim(),
                source,
                &self.cancel,
            )
            .await;

        self.finish_transfer(&file_name, result)
    }

    fn finish_transfer(
        &mut self,
        file_name: &str,
        result: crate::client::Result<TransferOutcome>,
    ) -> Option<TransferOutcome> {
        // a cancel request only ever applies to the transfer in flight
        self.cancel.reset();

        match result {
            Ok(TransferOutcome::Completed { bytes }) => {
                self.status.loaded(format_compact!("Transferred {file_name} ({bytes} bytes)"));
                Some(TransferOutcome::Completed { bytes })
            },
            Ok(TransferOutcome::Cancelled) => {
                self.status.failed(format_compact!("Transfer of {file_name} cancelled"));
                Some(TransferOutcome::Cancelled)
            },
            Err(e) => {
                self.status.client_failed(&format_compact!("Transfer of {file_name}"), &e);
                None
            },
        }
    }

    /// Flag shared with a running transfer; cancelling it stops the transfer
    /// at its next check
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn selected_package(&self) -> Option<&Package> {
        let selected = self.selected?;
        self.packages.iter().find(|p| p.id == selected)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn files(&self) -> &[PackageFile] {
        &self.files
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }
}
