pub mod domain;
pub mod ports;
pub mod progress;
pub mod search;
pub mod validation;

pub use domain::{
    Challenge, ChallengeId, ChallengeStep, Credentials, JoinOutcome, JoinRequest, JoinedChallenge,
    NewStory, ProfileSummary, Registration, Reward, Session, Story, StoryFeedback, StoryId,
    UserChallenge, UserChallengeId, UserId,
};
pub use ports::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, PortError, PortResult, SessionStore,
};
pub use validation::{Field, FieldError, ValidationErrors};
