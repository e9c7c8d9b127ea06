//! `ldk remind ...`: the reminder dialog's actions from a terminal.

use anyhow::Result;
use ldk_reminder::ChannelVerdict;
use ldk_schemas::ReminderChannel;

use super::{load_settings, open_desk};

fn channels(filter: Option<&str>) -> Result<Vec<ReminderChannel>> {
    Ok(match filter {
        Some(c) => vec![ReminderChannel::parse(c)?],
        None => ReminderChannel::ALL.to_vec(),
    })
}

/// One line per channel: `channel=<c> verdict=<due|snoozed|idle> ...`.
pub async fn check(channel: Option<&str>) -> Result<()> {
    let settings = load_settings()?.settings;
    let desk = open_desk().await?;

    for ch in channels(channel)? {
        let check = desk.check_channel(ch, &settings).await?;
        match check.verdict {
            ChannelVerdict::Due(rows) => {
                println!("channel={} verdict=due rows={}", ch.as_str(), rows.len());
                for r in rows {
                    match r.detail {
                        Some(d) => println!("  order_id={} label={} detail={}", r.order_id, r.label, d),
                        None => println!("  order_id={} label={}", r.order_id, r.label),
                    }
                }
            }
            ChannelVerdict::Snoozed { until } => {
                println!("channel={} verdict=snoozed until={}", ch.as_str(), until.to_rfc3339());
            }
            ChannelVerdict::Idle(reason) => {
                println!("channel={} verdict=idle reason={:?}", ch.as_str(), reason);
            }
        }
    }
    Ok(())
}

pub async fn snooze(channel: &str, minutes: i64) -> Result<()> {
    let channel = ReminderChannel::parse(channel)?;
    let desk = open_desk().await?;
    let until = desk.snooze(channel, minutes).await?;
    println!("channel={} snoozed_until={}", channel.as_str(), until.to_rfc3339());
    Ok(())
}

pub async fn mark_ordered(channel: &str) -> Result<()> {
    let channel = ReminderChannel::parse(channel)?;
    let desk = open_desk().await?;
    let n = desk.bulk_mark_ordered(channel).await?;
    println!("channel={} marked_ordered={}", channel.as_str(), n);
    Ok(())
}
