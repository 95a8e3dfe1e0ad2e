mod answer_key;
mod ids;
mod question;
mod result;
mod session;

pub use answer_key::AnswerKey;
pub use ids::{OptionId, ParseIdError, QuestionBankId, QuestionId, TestSessionId};
pub use question::{
    OptionPublicView, OptionView, QuestionBankSummary, QuestionError, QuestionType, QuestionView,
    QuestionWithOptions,
};
pub use result::{SubmittedAnswer, TestResult};
pub use session::{SessionError, TestSession};
