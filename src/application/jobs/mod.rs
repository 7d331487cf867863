mod context;
mod daily_post;

pub use context::job_failed;
pub use daily_post::{
    DailyPostContext, DailyPostJob, daily_post_schedule, process_daily_post_job,
};
