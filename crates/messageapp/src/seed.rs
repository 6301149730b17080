use messages::{AppError, MessageId, MessagesService, ModifyMessage};
use tracing::info;

/// Insert `count` generated messages through the service.
///
/// Every fifth message is a palindrome so listings show both values of
/// `isPalindrome`.
pub async fn seed_messages(
    service: &MessagesService,
    count: u32,
) -> Result<Vec<MessageId>, AppError> {
    let mut ids = Vec::with_capacity(count as usize);
    for i in 1..=count {
        let text = if i % 5 == 0 {
            let digits = i.to_string();
            let reversed: String = digits.chars().rev().collect();
            format!("{}{}", digits, reversed)
        } else {
            format!("message {}", i)
        };
        ids.push(service.create(&ModifyMessage::new(text)).await?);
    }
    if count > 0 {
        info!(count, "seeded messages");
    }
    Ok(ids)
}
