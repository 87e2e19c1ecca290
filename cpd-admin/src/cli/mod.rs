//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::CertificateForm;

/// cpd-admin - manage CPD certificates from the terminal
#[derive(Parser, Debug)]
#[command(name = "cpd-admin")]
#[command(version)]
#[command(about = "Manage CPD certificates from the terminal", long_about = None)]
pub struct Cli {
    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session
    ///
    /// The password is read from APP_LOGIN__PASSWORD, or from stdin.
    Login {
        #[arg(long, env = "APP_LOGIN__EMAIL")]
        email: Option<String>,

        /// Remember the email for the next login
        #[arg(long)]
        remember: bool,
    },

    /// Revoke the token and clear the local session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Re-fetch the profile from the server
        #[arg(long)]
        refresh: bool,
    },

    /// Show whether a session is present
    Status,

    /// List all certificates
    List,

    /// Show one certificate
    Show { id: u64 },

    /// Create a certificate
    Create(CertificateFields),

    /// Edit a certificate; omitted fields keep their current value
    Update {
        id: u64,

        #[command(flatten)]
        fields: CertificateFields,

        /// Attach a PDF, sending the edit as multipart
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a certificate
    Delete { id: u64 },

    /// Upload a rendered PDF and mark the certificate as generated
    MarkGenerated { id: u64, pdf: PathBuf },

    /// Upload a certificate file
    Upload { id: u64, path: PathBuf },

    /// Print session state changes until interrupted
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CertificateFields {
    #[arg(long)]
    pub full_name: Option<String>,

    /// CPD activity title
    #[arg(long)]
    pub title: Option<String>,

    /// CPD activity code
    #[arg(long)]
    pub code: Option<String>,

    /// Activity date, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,

    /// CPD hours or points
    #[arg(long)]
    pub points: Option<String>,

    /// Certificate state, e.g. Generate
    #[arg(long)]
    pub state: Option<String>,
}

impl CertificateFields {
    /// Overwrite the fields that were given.
    pub fn apply(self, form: &mut CertificateForm) {
        let targets = [
            (self.full_name, &mut form.full_name),
            (self.title, &mut form.cpd_activity_title),
            (self.code, &mut form.cpd_activity_code),
            (self.date, &mut form.date_of_cpd_activity),
            (self.points, &mut form.no_cpd_hours_points),
            (self.state, &mut form.certificate_state),
        ];
        for (value, target) in targets {
            if let Some(value) = value {
                *target = value.trim().to_string();
            }
        }
    }

    pub fn into_form(self) -> CertificateForm {
        let mut form = CertificateForm::default();
        self.apply(&mut form);
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_update_with_partial_fields() {
        let cli = Cli::try_parse_from([
            "cpd-admin", "update", "7", "--title", "Safeguarding", "--file", "cert.pdf",
        ])
        .unwrap();
        match cli.command {
            Command::Update { id, fields, file } => {
                assert_eq!(id, 7);
                assert_eq!(fields.title.as_deref(), Some("Safeguarding"));
                assert!(fields.full_name.is_none());
                assert_eq!(file, Some(PathBuf::from("cert.pdf")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn apply_only_touches_given_fields() {
        let mut form = CertificateForm {
            full_name: "Jane Doe".into(),
            cpd_activity_title: "Old".into(),
            ..CertificateForm::default()
        };
        CertificateFields {
            title: Some("  New  ".into()),
            ..CertificateFields::default()
        }
        .apply(&mut form);

        assert_eq!(form.full_name, "Jane Doe");
        assert_eq!(form.cpd_activity_title, "New");
        assert_eq!(form.certificate_state, "Generate");
    }
}
