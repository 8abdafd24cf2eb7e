//! Headless probe for the chat client: list groups, open one, print events,
//! send whatever you type. `/switch <id>` changes group, `/retry` re-runs a
//! failed load, `/quit` exits.

use tokio::io::{AsyncBufReadExt, BufReader};

use community_fit::client::config::ClientConfig;
use community_fit::client::services::chat_coordinator::{ChatCoordinator, ChatEvent};
use community_fit::client::services::groups_service::GroupsService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ClientConfig::from_env();
    println!(
        "Using API {} / WS {}",
        config.api_base_url, config.websocket_url
    );

    let groups = GroupsService::new(config.api_base_url.clone()).list().await?;
    if groups.is_empty() {
        println!("No groups available");
        return Ok(());
    }
    println!("Groups:");
    for group in &groups {
        println!(
            "  {:>4}  {} ({} members)",
            group.id,
            group.name,
            group.member_count.unwrap_or(0)
        );
    }

    let group_id = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(groups[0].id);

    let (coordinator, mut events) = ChatCoordinator::new(&config);

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ChatEvent::HistoryLoading { group_id } => {
                    println!("-- loading group {} --", group_id);
                }
                ChatEvent::HistoryLoaded { messages, .. } => {
                    for m in &messages {
                        println!("[{}] {}: {}", m.created_at.format("%H:%M"), m.sender_name, m.content);
                    }
                }
                ChatEvent::HistoryFailed { error, .. } => {
                    println!("-- history failed: {} (type /retry) --", error);
                }
                ChatEvent::MessageAppended { message, .. } => {
                    println!(
                        "[{}] {}: {}",
                        message.created_at.format("%H:%M"),
                        message.sender_name,
                        message.content
                    );
                }
                ChatEvent::ConnectionStatus { connected } => {
                    println!("-- {} --", if connected { "connected" } else { "disconnected" });
                }
            }
        }
    });

    if let Err(e) = coordinator.switch_to(group_id).await {
        println!("-- could not open group {}: {} --", group_id, e);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line == "/quit" {
            break;
        } else if line == "/retry" {
            if let Err(e) = coordinator.retry().await {
                println!("-- retry failed: {} --", e);
            }
        } else if let Some(rest) = line.strip_prefix("/switch ") {
            match rest.trim().parse() {
                Ok(id) => {
                    if let Err(e) = coordinator.switch_to(id).await {
                        println!("-- could not open group {}: {} --", id, e);
                    }
                }
                Err(_) => println!("usage: /switch <group-id>"),
            }
        } else {
            coordinator.send(&line).await?;
        }
    }
    Ok(())
}
