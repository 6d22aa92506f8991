//! Row models shared by both binaries.

pub mod blog;
pub mod campaign;
pub mod crystal;
pub mod notification;
pub mod order;
pub mod review;
pub mod subscriber;
pub mod user;

pub use blog::{BlogPost, NewBlogPost};
pub use campaign::{Campaign, NewCampaign};
pub use crystal::{Crystal, CrystalUpdate, NewCrystal};
pub use notification::{Notification, NotificationKind};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderDetail, OrderFilter, OrderItem, OrderStats,
};
pub use review::{NewReview, RatingSummary, Review};
pub use subscriber::{Subscriber, SubscriberCounts, SubscriberFilter};
pub use user::{Address, CustomerFilter, CustomerSummary, NewAddress, User};
