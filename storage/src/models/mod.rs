mod user_record;

pub use user_record::{MemberStatus, UserInfo, UserPhoto, UserRecord};
