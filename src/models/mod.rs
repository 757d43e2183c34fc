pub mod task;
pub mod user;

pub use task::{
    sort_tasks, SortKey, SortOrder, Task, TaskInput, TaskPriority, TaskQuery, TaskSort,
    TaskStatistics, TaskStatus, TaskUpdate,
};
pub use user::{Role, User, UserOut};
