//! Build tool argument vectors

use crate::settings::DEFAULT_BINARY;

/// Options every build starts with.
pub const BASE_OPTIONS: [&str; 3] = ["--skip-errors", "--no-ansi", "--verbose"];

/// Assembles the argument vector of one build.
///
/// ```text
/// [binary, "build", config_file, output_dir, options.., repository?, args..]
/// ```
///
/// Options are de-duplicated (first occurrence wins), arguments are not. The
/// repository name travels at the end of the option list, ahead of the extra
/// arguments. Building twice yields the same vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    binary: String,
    config_file: String,
    output_dir: String,
    repository: Option<String>,
    options: Vec<String>,
    extra_args: Vec<String>,
}

impl CommandBuilder {
    pub fn from(config_file: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            config_file: config_file.into(),
            output_dir: output_dir.into(),
            repository: None,
            options: BASE_OPTIONS.iter().map(|o| o.to_string()).collect(),
            extra_args: Vec::new(),
        }
    }

    /// Build tool path, relative to the install root.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Restrict the build to the repository called `name`.
    pub fn with_repository(mut self, name: impl Into<String>) -> Self {
        self.repository = Some(name.into());
        self
    }

    pub fn add_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    pub fn add_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut command = vec![
            self.binary.clone(),
            "build".to_string(),
            self.config_file.clone(),
            self.output_dir.clone(),
        ];

        let mut options: Vec<&String> = Vec::with_capacity(self.options.len() + 1);
        for option in self.options.iter().chain(&self.repository) {
            if !options.contains(&option) {
                options.push(option);
            }
        }

        command.extend(options.into_iter().cloned());
        command.extend(self.extra_args.iter().cloned());
        command
    }
}
