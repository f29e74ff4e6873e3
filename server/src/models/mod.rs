pub mod attendee;
pub mod comment;
pub mod event;
pub mod user;

pub use attendee::{Attendee, AttendeeFilter, AttendeeRow, NewAttendee};
pub use comment::{Comment, CreateComment, NewComment};
pub use event::{CreateEvent, Event, EventPatch, NewEvent};
pub use user::{NewUser, RegisterUser, TokenRequest, TokenResponse, User, UserCredentials};
