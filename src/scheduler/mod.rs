mod cursor;
mod failure;
mod group;
mod poller;

pub use poller::PollScheduler;
