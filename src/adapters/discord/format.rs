//! Embed and text formatting for the command surface.

use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::application::{
    AnswerOutcome, ChatHistoryView, CompletionReport, ConversationReply, DayAgenda,
    HomeworkAdded, MonthOverview, ReviewAdded, TaskOverview, TimerReport, TimerStarted,
};
use crate::domain::planner::{format_duration, StudyTask, TaskKind};
use crate::domain::quiz::{AnswerChoice, QuizQuestion};

// Discord palette.
pub const BLURPLE: u32 = 0x5865F2;
pub const GREEN: u32 = 0x57F287;
pub const RED: u32 = 0xED4245;
pub const GOLD: u32 = 0xFEE75C;
pub const PURPLE: u32 = 0x9B59B6;
pub const SOFT_BLUE: u32 = 0x87CEFA;

/// Discord caps message content at 2000 characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Truncates to at most `max` characters, appending an ellipsis when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Traffic-light badge for a review confidence.
pub fn confidence_badge(confidence: u8) -> &'static str {
    match confidence {
        0..=3 => "🔴",
        4..=6 => "🟡",
        _ => "🟢",
    }
}

fn status_icon(task: &StudyTask) -> &'static str {
    if task.completed {
        "✅"
    } else {
        "⏳"
    }
}

fn task_line(task: &StudyTask) -> String {
    match &task.kind {
        TaskKind::Homework { pages } => format!(
            "{} {} {} ({}) - {} min, due {}",
            status_icon(task),
            task.id,
            task.subject,
            pages,
            task.estimated_minutes,
            task.deadline.date().format("%m/%d"),
        ),
        TaskKind::Review { range, confidence } => format!(
            "{} {} {} ({}) {}{} - {} min",
            status_icon(task),
            task.id,
            task.subject,
            range,
            confidence_badge(*confidence),
            confidence,
            task.estimated_minutes,
        ),
    }
}

pub fn homework_added_embed(added: &HomeworkAdded) -> CreateEmbed {
    let task = &added.task;
    let pages = match &task.kind {
        TaskKind::Homework { pages } => pages.clone(),
        TaskKind::Review { range, .. } => range.clone(),
    };

    CreateEmbed::new()
        .title("✅ Homework added!")
        .description(format!("**{}** homework", task.subject))
        .color(GREEN)
        .field("📄 Pages", pages, true)
        .field("⏱️ Estimated", format!("{} min", task.estimated_minutes), true)
        .field("📅 Due", task.deadline.date().format("%Y-%m-%d").to_string(), true)
        .field("⏰ Time left", format!("{} days", added.days_left), true)
        .field("🔢 Task id", task.id.to_string(), true)
        .footer(CreateEmbedFooter::new("Use /start_timer to start working on it"))
}

pub fn review_added_embed(added: &ReviewAdded) -> CreateEmbed {
    let mut embed = if added.tasks.len() > 1 {
        let schedule: String = added
            .tasks
            .iter()
            .map(|t| {
                let range = match &t.kind {
                    TaskKind::Review { range, .. } => range.as_str(),
                    TaskKind::Homework { pages } => pages.as_str(),
                };
                format!(
                    "📅 {}: {} {}\n",
                    t.deadline.date().format("%Y-%m-%d"),
                    t.id,
                    range
                )
            })
            .collect();

        CreateEmbed::new()
            .title("🧠 Spaced repetition applied!")
            .description(format!(
                "Created **{}** review rounds for **{}**",
                added.tasks.len(),
                added.tasks[0].subject
            ))
            .color(PURPLE)
            .field("📅 Review plan", schedule, false)
    } else {
        let task = &added.tasks[0];
        let (range, confidence) = match &task.kind {
            TaskKind::Review { range, confidence } => (range.clone(), *confidence),
            TaskKind::Homework { pages } => (pages.clone(), 0),
        };

        CreateEmbed::new()
            .title("✅ Review added!")
            .description(format!("**{}** review", task.subject))
            .color(GREEN)
            .field("📖 Range", range, true)
            .field("⏱️ Estimated", format!("{} min", task.estimated_minutes), true)
            .field(
                "💪 Confidence",
                format!("{} {}/10", confidence_badge(confidence), confidence),
                true,
            )
            .field("🔢 Task id", task.id.to_string(), true)
    };

    if added.low_confidence {
        embed = embed.field(
            "💡 Advice",
            "Confidence is low - review this part first!",
            false,
        );
    }
    embed.footer(CreateEmbedFooter::new("Use /start_timer to start reviewing"))
}

pub fn task_completed_embed(report: &CompletionReport) -> CreateEmbed {
    let task = &report.task;
    let mut embed = CreateEmbed::new()
        .title("🎉 Task completed!")
        .description(format!("**{}** {}", task.subject, task.kind.label()))
        .color(GOLD)
        .field("⏱️ Estimated", format!("{} min", task.estimated_minutes), true);

    if let Some(actual) = task.actual_minutes {
        embed = embed.field("⏰ Actual", format!("{:.1} min", actual), true);
    }
    if let Some(efficiency) = report.efficiency_percent {
        let line = if efficiency > 100.0 {
            format!("👍 {:.0}% faster than planned", efficiency - 100.0)
        } else if efficiency < 100.0 {
            format!("⏱️ {:.0}% slower than planned", 100.0 - efficiency)
        } else {
            "🎯 Exactly as planned!".to_string()
        };
        embed = embed.field("📈 Efficiency", line, false);
    }

    embed.footer(CreateEmbedFooter::new("Great work - keep it up!"))
}

pub fn timer_started_embed(started: &TimerStarted) -> CreateEmbed {
    let task = &started.task;
    CreateEmbed::new()
        .title("⏱️ Timer started!")
        .description(format!("**{}** {}", task.subject, task.kind.label()))
        .color(BLURPLE)
        .field(
            "⏰ Started at",
            started.started_at.as_datetime().format("%H:%M:%S").to_string(),
            true,
        )
        .field("🎯 Estimated", format!("{} min", task.estimated_minutes), true)
        .field("🔢 Task id", task.id.to_string(), true)
        .footer(CreateEmbedFooter::new("Use /stop_timer when you're done"))
}

pub fn timer_report_embed(report: &TimerReport) -> CreateEmbed {
    let task = &report.task;
    let gap = if report.diff_minutes > 0.0 {
        format!("⏱️ {:.1} min over the estimate", report.diff_minutes)
    } else if report.diff_minutes < 0.0 {
        format!("👍 {:.1} min under the estimate", report.diff_minutes.abs())
    } else {
        "🎯 Spot on!".to_string()
    };

    CreateEmbed::new()
        .title("⏹️ Timer stopped!")
        .description(format!("**{}** {}", task.subject, task.kind.label()))
        .color(GREEN)
        .field("⏰ Time spent", format_duration(report.elapsed_secs), true)
        .field("🎯 Estimated", format!("{} min", task.estimated_minutes), true)
        .field("📊 Gap", gap, true)
        .field("💡 Tip", "Use /complete_task to mark it done", false)
}

pub fn overview_embed(overview: &TaskOverview) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title("📚 All tasks").color(BLURPLE);

    let homework: Vec<String> = overview
        .pending
        .iter()
        .filter(|t| matches!(t.kind, TaskKind::Homework { .. }))
        .take(10)
        .map(task_line)
        .collect();
    let reviews: Vec<String> = overview
        .pending
        .iter()
        .filter(|t| matches!(t.kind, TaskKind::Review { .. }))
        .take(10)
        .map(task_line)
        .collect();

    if !homework.is_empty() {
        embed = embed.field(
            format!("📝 Homework ({})", homework.len()),
            homework.join("\n"),
            false,
        );
    }
    if !reviews.is_empty() {
        embed = embed.field(
            format!("📚 Reviews ({})", reviews.len()),
            reviews.join("\n"),
            false,
        );
    }
    if !overview.completed.is_empty() {
        let recent: Vec<String> = overview
            .completed
            .iter()
            .rev()
            .take(5)
            .map(|t| format!("✅ {} {} ({})", t.id, t.subject, t.kind.label()))
            .collect();
        embed = embed.field("✅ Done (recent)", recent.join("\n"), false);
    }

    embed.field(
        "📊 Totals",
        format!(
            "{} tasks | {} pending | {} done\nEstimated total: {} min ({:.1} h)",
            overview.pending.len() + overview.completed.len(),
            overview.pending.len(),
            overview.completed.len(),
            overview.total_estimated_minutes,
            overview.total_estimated_minutes as f64 / 60.0,
        ),
        false,
    )
}

pub fn agenda_embed(agenda: &DayAgenda) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(format!("📅 Agenda for {}", agenda.date.format("%Y-%m-%d")))
        .color(BLURPLE);

    if agenda.task_count() == 0 {
        return embed
            .description("🎉 Nothing due this day!")
            .footer(CreateEmbedFooter::new(
                "Use /add_homework or /add_review to plan something",
            ));
    }

    embed = embed.description(format!("{} task(s) due", agenda.task_count()));
    if !agenda.homework.is_empty() {
        let lines: Vec<String> = agenda.homework.iter().map(task_line).collect();
        embed = embed.field(
            format!("📝 Homework ({})", agenda.homework.len()),
            lines.join("\n"),
            false,
        );
    }
    if !agenda.review.is_empty() {
        let lines: Vec<String> = agenda.review.iter().map(task_line).collect();
        embed = embed.field(
            format!("📚 Reviews ({})", agenda.review.len()),
            lines.join("\n"),
            false,
        );
    }

    embed.field(
        "📊 Totals",
        format!(
            "Estimated: {} min ({:.1} h)\nProgress: {}/{}",
            agenda.total_estimated_minutes,
            agenda.total_estimated_minutes as f64 / 60.0,
            agenda.completed_count,
            agenda.task_count(),
        ),
        false,
    )
}

pub fn month_embed(overview: &MonthOverview) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(format!("📅 {} / {}", overview.year, overview.month))
        .description("Days with deadlines are marked with *")
        .color(BLURPLE)
        .field("Calendar", format!("```\n{}```", overview.grid), false);

    let days_with_tasks = overview.days.len();
    embed = embed.field(
        "📊 Stats",
        format!(
            "{} task(s) across {} day(s)",
            overview.total_tasks, days_with_tasks
        ),
        false,
    );

    if !overview.days.is_empty() {
        let mut lines: Vec<String> = overview
            .days
            .iter()
            .take(10)
            .map(|(day, tally)| {
                let status = if tally.completed == tally.total {
                    "✅"
                } else {
                    "⏳"
                };
                format!(
                    "{} {}/{} - {} task(s), {} done",
                    status, overview.month, day, tally.total, tally.completed
                )
            })
            .collect();
        if overview.days.len() > 10 {
            lines.push(format!("... and {} more day(s)", overview.days.len() - 10));
        }
        embed = embed.field("📋 Deadline days", lines.join("\n"), false);
    }

    embed.footer(CreateEmbedFooter::new(
        "Use /agenda to inspect a single day",
    ))
}

pub fn quiz_embed(subject: &str, question: &QuizQuestion, bank_size: usize) -> CreateEmbed {
    let options: String = AnswerChoice::ALL
        .iter()
        .map(|choice| format!("**{}.** {}\n", choice, question.option_text(*choice)))
        .collect();

    CreateEmbed::new()
        .title(format!("📝 {} question", subject))
        .description(format!("{}\n\n{}", question.question, options))
        .color(BLURPLE)
        .footer(CreateEmbedFooter::new(format!(
            "Answer with /answer choice:<A-D> · drawn from {} chunk(s)",
            bank_size
        )))
}

pub fn answer_embed(outcome: &AnswerOutcome) -> CreateEmbed {
    let correct = outcome.question.correct_answer;
    let (title, color) = if outcome.correct {
        (format!("✅ Correct! The answer is {}", correct), GREEN)
    } else {
        (
            format!(
                "❌ Not quite - you chose {}, the answer is {}",
                outcome.selected, correct
            ),
            RED,
        )
    };

    CreateEmbed::new()
        .title(title)
        .color(color)
        .field(
            format!("📖 {} - {}", correct, outcome.question.option_text(correct)),
            truncate_chars(&outcome.question.explanation, 1000),
            false,
        )
}

pub fn chat_embed(reply: &ConversationReply) -> CreateEmbed {
    let footer = match reply.exchanges {
        0 | 1 => "Our first chat 🌱 come back any time".to_string(),
        2..=5 => format!("We've talked {} times 🌿 I'm getting to know you", reply.exchanges),
        n => format!("Old friends by now! {} chats 🌳", n),
    };

    CreateEmbed::new()
        .title("💙 Chat time")
        .description(truncate_chars(&reply.content, 4000))
        .color(SOFT_BLUE)
        .footer(CreateEmbedFooter::new(footer))
        .timestamp(serenity::model::Timestamp::now())
}

pub fn chat_history_embed(view: &ChatHistoryView) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("💙 Chat history")
        .description(format!("{} exchange(s) so far", view.exchanges()))
        .color(SOFT_BLUE);

    let recent: Vec<String> = view
        .recent_exchanges(3)
        .into_iter()
        .map(|(user, assistant)| {
            format!(
                "**You:** {}\n**Me:** {}\n",
                truncate_chars(&user.content, 50),
                truncate_chars(&assistant.content, 100),
            )
        })
        .collect();
    if !recent.is_empty() {
        embed = embed.field("📝 Recent", recent.join("\n"), false);
    }
    if !view.personality.is_empty() {
        embed = embed.field(
            "🎭 How I read you",
            truncate_chars(&view.personality, 1000),
            false,
        );
    }

    embed.footer(CreateEmbedFooter::new("/chat_clear starts over"))
}

pub fn guide_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("📚 Studykeeper guide")
        .description("Everything the bot can do:")
        .color(BLURPLE)
        .field(
            "💙 /chat",
            "Talk through study stress; the bot remembers your personality",
            false,
        )
        .field("📝 /quiz + /answer", "Random question from a subject's bank", false)
        .field(
            "1️⃣ /add_homework",
            "date (YYYY-MM-DD), subject, pages, estimated minutes",
            false,
        )
        .field(
            "2️⃣ /add_review",
            "subject, range, confidence 1-10, optional spaced repetition",
            false,
        )
        .field("3️⃣ /delete_task · /complete_task", "Manage tasks by id", false)
        .field("4️⃣ /start_timer · /stop_timer", "Time your work on a task", false)
        .field("5️⃣ /calendar · /agenda", "Month grid and one-day view", false)
        .field("🍅 /focus", "25-minute focus + 5-minute break with audio", false)
        .field(
            "🔊 /join_voice · /music_stop · /focus_stop",
            "Voice and audio control",
            false,
        )
        .field(
            "🛠️ /reload_bank · /ingest_bank",
            "Maintain the quiz knowledge bank",
            false,
        )
        .footer(CreateEmbedFooter::new("Mention me for a quick question!"))
}
