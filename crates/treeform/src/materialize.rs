//! Write a classified tree to disk

use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, trace};

use crate::error::{Error, Result};
use crate::node::{Directory, Node};
use crate::project::{select_projects, Project, Selection};
use crate::value::Mapping;

/// Permission bits applied to created entries (Unix only)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterializeOptions {
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            dir_mode: 0o755,
            file_mode: 0o644,
        }
    }
}

impl MaterializeOptions {
    pub const fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    pub const fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }
}

/// Counts of what a materialization touched
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub directories: usize,
    pub files: usize,
    /// Total content bytes written
    pub bytes: u64,
}

impl Summary {
    fn absorb(&mut self, other: Self) {
        self.directories += other.directories;
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// Outcome of building one project
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectReport {
    pub name: String,
    pub path: PathBuf,
    pub summary: Summary,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Materializer {
    options: MaterializeOptions,
}

impl Materializer {
    pub const fn new(options: MaterializeOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> &MaterializeOptions {
        &self.options
    }

    /// Create every entry of `dir` under `base`, in order.
    ///
    /// Existing directories are reused and existing files are truncated, so
    /// running twice leaves the same state. The first failure aborts; entries
    /// written before it stay on disk.
    pub fn materialize(&self, dir: &Directory, base: &Path) -> Result<Summary> {
        let mut summary = Summary::default();
        for (name, node) in dir {
            let path = base.join(name);
            match node {
                Node::Directory(child) => {
                    self.create_dir(&path)?;
                    summary.directories += 1;
                    summary.absorb(self.materialize(child, &path)?);
                }
                Node::File(file) => {
                    if let Some(parent) = path.parent() {
                        self.create_dir(parent)?;
                    }
                    self.write_file(&path, file.content().as_bytes())?;
                    summary.files += 1;
                    summary.bytes += u64::try_from(file.content().len()).unwrap_or(u64::MAX);
                }
            }
        }
        Ok(summary)
    }

    /// Classify `mapping` and materialize it under `base`
    pub fn materialize_mapping(&self, mapping: &Mapping, base: &Path) -> Result<Summary> {
        self.materialize(&Directory::from_mapping(mapping), base)
    }

    /// Create `cwd/<name>` and fill it with the project's entries
    pub fn build_project(&self, project: &Project, cwd: &Path) -> Result<ProjectReport> {
        let path = cwd.join(&project.name);
        self.create_dir(&path)?;
        let mut summary = Summary {
            directories: 1,
            ..Summary::default()
        };
        summary.absorb(self.materialize(&project.root, &path)?);

        info!(
            project = %project.name,
            directories = summary.directories,
            files = summary.files,
            "project created"
        );
        Ok(ProjectReport {
            name: project.name.clone(),
            path,
            summary,
        })
    }

    /// Build the selected top-level projects of a decoded tree under `cwd`.
    ///
    /// Every selected project is checked before anything is written.
    #[instrument(level = "debug", skip_all, fields(cwd = %cwd.display(), ?selection))]
    pub fn build_projects(
        &self,
        tree: &Mapping,
        cwd: &Path,
        selection: Selection,
    ) -> Result<Vec<ProjectReport>> {
        select_projects(tree, selection)?
            .iter()
            .map(|project| self.build_project(project, cwd))
            .collect()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.options.dir_mode);
        }
        builder.create(path).map_err(|source| Error::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;
        trace!(path = %path.display(), "directory ready");
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.options.file_mode);
        }
        let wrap = |source| Error::WriteFile {
            path: path.to_path_buf(),
            source,
        };
        let mut file = options.open(path).map_err(wrap)?;
        file.write_all(content).map_err(wrap)?;
        trace!(path = %path.display(), bytes = content.len(), "file written");
        Ok(())
    }
}

/// Build projects with the default permission bits
pub fn build_projects(
    tree: &Mapping,
    cwd: impl AsRef<Path>,
    selection: Selection,
) -> Result<Vec<ProjectReport>> {
    Materializer::default().build_projects(tree, cwd.as_ref(), selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::File;
    use std::fs;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn sample() -> Directory {
        let mut src = Directory::new();
        src.insert("main.rs", Node::File(File::new("fn main() {}\n")));
        let mut root = Directory::new();
        root.insert("src", Node::Directory(src));
        root.insert("README.md", Node::File(File::new("# demo")));
        root.insert("empty", Node::Directory(Directory::new()));
        root
    }

    #[test]
    fn test_materialize_counts() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let summary = Materializer::default().materialize(&sample(), tmp.path())?;
        assert_eq!(
            summary,
            Summary {
                directories: 2,
                files: 2,
                bytes: 19,
            }
        );
        assert_eq!(fs::read_to_string(tmp.path().join("src/main.rs"))?, "fn main() {}\n");
        assert!(tmp.path().join("empty").is_dir());
        Ok(())
    }

    #[test]
    fn test_materialize_twice_is_stable() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let materializer = Materializer::default();
        materializer.materialize(&sample(), tmp.path())?;
        fs::write(tmp.path().join("README.md"), "a much longer edit that must go away")?;
        materializer.materialize(&sample(), tmp.path())?;
        assert_eq!(fs::read_to_string(tmp.path().join("README.md"))?, "# demo");
        Ok(())
    }

    #[test]
    fn test_file_in_the_way_of_directory() -> TestResult {
        let tmp = tempfile::tempdir()?;
        fs::write(tmp.path().join("src"), "blocking")?;
        let err = Materializer::default().materialize(&sample(), tmp.path()).err();
        assert!(
            matches!(&err, Some(Error::CreateDir { path, .. }) if path.ends_with("src")),
            "got {err:?}"
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_modes_applied() -> TestResult {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir()?;
        let options = MaterializeOptions::default().with_file_mode(0o600);
        Materializer::new(options).materialize(&sample(), tmp.path())?;
        let mode = fs::metadata(tmp.path().join("README.md"))?.permissions().mode();
        assert_eq!(mode & 0o077, 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_default_modes() -> TestResult {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir()?;
        Materializer::default().materialize(&sample(), tmp.path())?;

        // The umask can only clear bits, never add them.
        let dir = fs::metadata(tmp.path().join("src"))?.permissions().mode() & 0o777;
        assert_eq!(dir & 0o700, 0o700, "dir mode {dir:o}");
        assert_eq!(dir & 0o022, 0, "dir mode {dir:o}");

        let file = fs::metadata(tmp.path().join("src/main.rs"))?.permissions().mode() & 0o777;
        assert_eq!(file & 0o600, 0o600, "file mode {file:o}");
        assert_eq!(file & 0o133, 0, "file mode {file:o}");
        Ok(())
    }

    #[test]
    fn test_build_projects_reports_paths() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let mut app = Mapping::new();
        app.insert("a.txt", "a");
        let mut tree = Mapping::new();
        tree.insert("app", app);

        let reports = build_projects(&tree, tmp.path(), Selection::First)?;
        assert_eq!(reports.len(), 1);
        let report = reports.first().ok_or("no report")?;
        assert_eq!(report.path, tmp.path().join("app"));
        assert_eq!(report.summary.directories, 1);
        assert_eq!(report.summary.files, 1);
        assert_eq!(fs::read_to_string(report.path.join("a.txt"))?, "a");
        Ok(())
    }
}
