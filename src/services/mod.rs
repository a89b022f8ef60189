pub mod link_url;
pub mod mailer;
pub mod password;
pub mod renderer;
pub mod temporary_link;

pub use mailer::{LogTransport, MailTransport};
pub use renderer::{AskamaRenderer, TemplateRenderer};
pub use temporary_link::{
    ActivationLinkInfo, IssueOutcome, Rejection, ResetLinkInfo, TemporaryLinkIssuer,
};
