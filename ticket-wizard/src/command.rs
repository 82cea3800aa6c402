//! Terminal commands.
//!
//! Each input line parses into a [`Command`]. Most commands map directly onto
//! a [`WizardAction`]; the rest are handled by the front-end itself.

use crate::navigation::WizardStep;
use crate::reducer::WizardAction;
use crate::types::TextField;
use std::path::PathBuf;
use thiserror::Error;

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  tickets                       list available tickets
  select <id>                   select a ticket
  next                          continue from the selection step
  back                          go to the previous step
  goto <selection|details|ticket>
                                jump to a step
  name <text>                   set attendee name
  email <text>                  set attendee email
  request <text>                set special request
  upload <path>                 upload a JPEG, PNG or GIF profile picture
  submit                        submit attendee details
  show                          show the current step
  clear                         remove the stored reservation
  help                          show this help
  quit                          exit";

/// A parsed input line
#[derive(Debug, Clone)]
pub enum Command {
    /// Forward an action to the store
    Dispatch(WizardAction),
    /// Read a file and start an upload
    Upload(PathBuf),
    /// Print the catalog
    Tickets,
    /// Print the current step
    Show,
    /// Print the help text
    Help,
    /// Exit
    Quit,
}

/// Input that is not a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// Unrecognized verb
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    /// Required argument missing
    #[error("'{command}' needs {expected}")]
    MissingArgument {
        /// The verb
        command: &'static str,
        /// What should follow it
        expected: &'static str,
    },

    /// Route that matches no step
    #[error("unknown step '{0}', use selection, details or ticket")]
    UnknownStep(String),
}

impl Command {
    /// Parses one input line
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] for blank, unknown or incomplete input.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let required = |command: &'static str, expected: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument { command, expected })
            } else {
                Ok(rest.to_string())
            }
        };
        let edit = |field: TextField, value: String| {
            Self::Dispatch(WizardAction::EditField { field, value })
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "tickets" | "list" => Self::Tickets,
            "select" => Self::Dispatch(WizardAction::SelectOffering {
                offering_id: required("select", "a ticket id")?,
            }),
            "next" | "proceed" => Self::Dispatch(WizardAction::Proceed),
            "back" => Self::Dispatch(WizardAction::Back),
            "goto" => {
                let route = required("goto", "a step name")?;
                let step = route
                    .parse::<WizardStep>()
                    .map_err(|_| CommandError::UnknownStep(route.clone()))?;
                Self::Dispatch(WizardAction::Navigate(step))
            },
            // Text fields accept an empty value so they can be cleared.
            "name" => edit(TextField::Name, rest.to_string()),
            "email" => edit(TextField::Email, rest.to_string()),
            "request" => edit(TextField::SpecialRequest, rest.to_string()),
            "upload" => Self::Upload(PathBuf::from(required("upload", "a file path")?)),
            "submit" => Self::Dispatch(WizardAction::SubmitDetails),
            "show" => Self::Show,
            "clear" => Self::Dispatch(WizardAction::ClearReservation),
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn select_takes_an_id() {
        match Command::parse("select paid-2").unwrap() {
            Command::Dispatch(WizardAction::SelectOffering { offering_id }) => {
                assert_eq!(offering_id, "paid-2");
            },
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(
            Command::parse("select").unwrap_err(),
            CommandError::MissingArgument {
                command: "select",
                expected: "a ticket id"
            }
        );
    }

    #[test]
    fn text_fields_keep_inner_spaces() {
        match Command::parse("  name   Ada Lovelace  ").unwrap() {
            Command::Dispatch(WizardAction::EditField { field, value }) => {
                assert_eq!(field, TextField::Name);
                assert_eq!(value, "Ada Lovelace");
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn goto_parses_routes() {
        assert!(matches!(
            Command::parse("goto ticket").unwrap(),
            Command::Dispatch(WizardAction::Navigate(WizardStep::Confirmation))
        ));
        assert_eq!(
            Command::parse("goto payment").unwrap_err(),
            CommandError::UnknownStep("payment".into())
        );
    }

    #[test]
    fn upload_needs_a_path() {
        assert!(matches!(
            Command::parse("upload ./me.png").unwrap(),
            Command::Upload(path) if path == PathBuf::from("./me.png")
        ));
        assert!(Command::parse("upload").is_err());
    }

    #[test]
    fn front_end_commands() {
        assert!(matches!(Command::parse("tickets").unwrap(), Command::Tickets));
        assert!(matches!(Command::parse("SHOW").unwrap(), Command::Show));
        assert!(matches!(Command::parse("quit").unwrap(), Command::Quit));
        assert_eq!(Command::parse("   ").unwrap_err(), CommandError::Empty);
        assert_eq!(
            Command::parse("pay now").unwrap_err(),
            CommandError::Unknown("pay".into())
        );
    }
}
