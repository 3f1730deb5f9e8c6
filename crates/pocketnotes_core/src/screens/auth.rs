//! Login and register forms.

use super::navigation::Route;
use super::{Dialog, Effect, NavAction};
use crate::identity::AuthError;
use crate::model::user::{normalize_credentials, CredentialsError, UserHandle};

const MISSING_CREDENTIALS: &str = "Please enter both email and password";

/// Identity failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    DuplicateAccount,
    Validation(CredentialsError),
    Unavailable(String),
}

impl From<&AuthError> for AuthFailure {
    fn from(value: &AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::DuplicateAccount(_) => Self::DuplicateAccount,
            AuthError::Validation(err) => Self::Validation(err.clone()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMsg {
    EmailChanged(String),
    PasswordChanged(String),
    Submit,
    Succeeded(UserHandle),
    Failed(AuthFailure),
    OpenRegister,
}

/// Login form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginScreen {
    pub email: String,
    pub password: String,
    /// A login request is in flight; further submits are ignored.
    pub submitting: bool,
    /// Trimmed email of the request in flight; Home is titled with it.
    pub submitted_email: Option<String>,
}

impl LoginScreen {
    pub fn update(&mut self, msg: LoginMsg) -> Vec<Effect> {
        match msg {
            LoginMsg::EmailChanged(value) => {
                self.email = value;
                Vec::new()
            }
            LoginMsg::PasswordChanged(value) => {
                self.password = value;
                Vec::new()
            }
            LoginMsg::Submit => {
                if self.submitting {
                    return Vec::new();
                }
                match normalize_credentials(&self.email, &self.password) {
                    Ok((email, password)) => {
                        let effect = Effect::Login {
                            email: email.to_string(),
                            password: password.to_string(),
                        };
                        self.submitting = true;
                        self.submitted_email = Some(email.to_string());
                        vec![effect]
                    }
                    Err(_) => vec![Effect::ShowDialog(Dialog::alert(
                        "Error",
                        MISSING_CREDENTIALS,
                    ))],
                }
            }
            LoginMsg::Succeeded(user) => {
                self.submitting = false;
                self.password.clear();
                let typed_email = self
                    .submitted_email
                    .take()
                    .unwrap_or_else(|| user.email.clone());
                vec![Effect::Navigate(NavAction::Replace(Route::home(
                    &user,
                    typed_email,
                )))]
            }
            LoginMsg::Failed(failure) => {
                self.submitting = false;
                self.submitted_email = None;
                let dialog = match failure {
                    AuthFailure::Unavailable(_) => Dialog::alert(
                        "Login Failed",
                        "Could not reach the account service. Please try again.",
                    ),
                    _ => Dialog::alert("Login Failed", "Invalid email or password"),
                };
                vec![Effect::ShowDialog(dialog)]
            }
            LoginMsg::OpenRegister => vec![Effect::Navigate(NavAction::Push(Route::Register))],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterMsg {
    EmailChanged(String),
    PasswordChanged(String),
    Submit,
    Succeeded(UserHandle),
    Failed(AuthFailure),
    BackToLogin,
}

/// Register form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterScreen {
    pub email: String,
    pub password: String,
    pub submitting: bool,
}

impl RegisterScreen {
    pub fn update(&mut self, msg: RegisterMsg) -> Vec<Effect> {
        match msg {
            RegisterMsg::EmailChanged(value) => {
                self.email = value;
                Vec::new()
            }
            RegisterMsg::PasswordChanged(value) => {
                self.password = value;
                Vec::new()
            }
            RegisterMsg::Submit => {
                if self.submitting {
                    return Vec::new();
                }
                match normalize_credentials(&self.email, &self.password) {
                    Ok((email, password)) => {
                        let effect = Effect::Register {
                            email: email.to_string(),
                            password: password.to_string(),
                        };
                        self.submitting = true;
                        vec![effect]
                    }
                    Err(_) => vec![Effect::ShowDialog(Dialog::alert(
                        "Error",
                        MISSING_CREDENTIALS,
                    ))],
                }
            }
            RegisterMsg::Succeeded(_) => {
                *self = Self::default();
                vec![
                    Effect::ShowDialog(Dialog::alert("Success", "Account created! Please login.")),
                    Effect::Navigate(NavAction::Back),
                ]
            }
            RegisterMsg::Failed(failure) => {
                self.submitting = false;
                let message = match failure {
                    AuthFailure::DuplicateAccount => "This email is already registered.",
                    AuthFailure::Validation(CredentialsError::MalformedEmail(_)) => {
                        "Please enter a valid email address."
                    }
                    _ => "Failed to register user.",
                };
                vec![Effect::ShowDialog(Dialog::alert("Error", message))]
            }
            RegisterMsg::BackToLogin => vec![Effect::Navigate(NavAction::Back)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthFailure, LoginMsg, LoginScreen, RegisterMsg, RegisterScreen};
    use crate::model::user::UserHandle;
    use crate::screens::navigation::Route;
    use crate::screens::{Dialog, Effect, NavAction};
    use uuid::Uuid;

    fn filled_login(email: &str, password: &str) -> LoginScreen {
        let mut screen = LoginScreen::default();
        screen.update(LoginMsg::EmailChanged(email.to_string()));
        screen.update(LoginMsg::PasswordChanged(password.to_string()));
        screen
    }

    #[test]
    fn login_submit_with_blank_field_shows_dialog_only() {
        let mut screen = filled_login("  ", "pw");
        let effects = screen.update(LoginMsg::Submit);
        assert_eq!(
            effects,
            vec![Effect::ShowDialog(Dialog::alert(
                "Error",
                "Please enter both email and password"
            ))]
        );
        assert!(!screen.submitting);
    }

    #[test]
    fn login_submit_trims_email_and_blocks_double_submit() {
        let mut screen = filled_login(" me@example.com ", "pw");
        let effects = screen.update(LoginMsg::Submit);
        assert_eq!(
            effects,
            vec![Effect::Login {
                email: "me@example.com".to_string(),
                password: "pw".to_string()
            }]
        );
        assert!(screen.update(LoginMsg::Submit).is_empty());
    }

    #[test]
    fn login_success_replaces_stack_with_home() {
        let mut screen = filled_login("me@example.com", "pw");
        screen.update(LoginMsg::Submit);
        let user = UserHandle {
            uid: Uuid::new_v4(),
            email: "me@example.com".to_string(),
        };
        let effects = screen.update(LoginMsg::Succeeded(user.clone()));
        assert_eq!(
            effects,
            vec![Effect::Navigate(NavAction::Replace(Route::home(
                &user,
                "me@example.com"
            )))]
        );
        assert!(screen.password.is_empty());
        assert!(screen.submitted_email.is_none());
    }

    #[test]
    fn login_success_titles_home_with_typed_email() {
        let mut screen = filled_login("  ME@Example.com ", "pw");
        screen.update(LoginMsg::Submit);
        let user = UserHandle {
            uid: Uuid::new_v4(),
            email: "me@example.com".to_string(),
        };
        let effects = screen.update(LoginMsg::Succeeded(user.clone()));
        assert_eq!(
            effects,
            vec![Effect::Navigate(NavAction::Replace(Route::Home {
                owner_email: "ME@Example.com".to_string(),
                owner_id: user.uid,
            }))]
        );
    }

    #[test]
    fn login_failure_shows_invalid_credentials_dialog() {
        let mut screen = filled_login("me@example.com", "bad");
        screen.update(LoginMsg::Submit);
        let effects = screen.update(LoginMsg::Failed(AuthFailure::InvalidCredentials));
        assert_eq!(
            effects,
            vec![Effect::ShowDialog(Dialog::alert(
                "Login Failed",
                "Invalid email or password"
            ))]
        );
        assert!(!screen.submitting);
    }

    #[test]
    fn register_success_confirms_and_goes_back() {
        let mut screen = RegisterScreen::default();
        screen.update(RegisterMsg::EmailChanged("new@example.com".to_string()));
        screen.update(RegisterMsg::PasswordChanged("pw".to_string()));
        screen.update(RegisterMsg::Submit);
        let user = UserHandle {
            uid: Uuid::new_v4(),
            email: "new@example.com".to_string(),
        };
        let effects = screen.update(RegisterMsg::Succeeded(user));
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[1], Effect::Navigate(NavAction::Back));
        assert_eq!(screen, RegisterScreen::default());
    }

    #[test]
    fn register_failure_distinguishes_duplicate() {
        let mut screen = RegisterScreen::default();
        let duplicate = screen.update(RegisterMsg::Failed(AuthFailure::DuplicateAccount));
        assert_eq!(
            duplicate,
            vec![Effect::ShowDialog(Dialog::alert(
                "Error",
                "This email is already registered."
            ))]
        );
        let other = screen.update(RegisterMsg::Failed(AuthFailure::Unavailable(
            "disk full".to_string(),
        )));
        assert_eq!(
            other,
            vec![Effect::ShowDialog(Dialog::alert(
                "Error",
                "Failed to register user."
            ))]
        );
    }
}
