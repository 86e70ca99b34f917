//! Info command - summarizes the store saved in a data directory.

use std::path::PathBuf;

use boardsync::{constants::SNAPSHOT_FILE, storage::Storage};

use crate::cli::InfoArgs;
use crate::output::{OutputFormat, print_table};

/// Run the info command
pub async fn run(args: &InfoArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let path = args
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SNAPSHOT_FILE);
    let storage = Storage::load_from_file(&path).await?;
    let stats = storage.stats().await;

    let mut rows = Vec::new();
    for board in storage.all_boards().await {
        let lists = storage.lists_for_board(board.id).await;
        let mut tasks = 0;
        for list in &lists {
            tasks += storage.tasks_in_list(list.id).await.len();
        }
        let members = storage.members(board.id).await.len();
        rows.push((board, lists.len(), tasks, members));
    }

    match format {
        OutputFormat::Human => {
            println!("Snapshot:    {}", path.display());
            println!("Boards:      {}", stats.boards);
            println!("Lists:       {}", stats.lists);
            println!("Tasks:       {}", stats.tasks);
            println!("Members:     {}", stats.members);
            println!("Activity:    {}", stats.activity);
            if !rows.is_empty() {
                println!();
                let table: Vec<Vec<String>> = rows
                    .iter()
                    .map(|(board, lists, tasks, members)| {
                        vec![
                            board.id.to_string(),
                            board.title.clone(),
                            lists.to_string(),
                            tasks.to_string(),
                            members.to_string(),
                        ]
                    })
                    .collect();
                print_table(&["ID", "TITLE", "LISTS", "TASKS", "MEMBERS"], &table);
            }
        }
        OutputFormat::Json => {
            let boards: Vec<serde_json::Value> = rows
                .iter()
                .map(|(board, lists, tasks, members)| {
                    serde_json::json!({
                        "id": board.id,
                        "title": board.title,
                        "lists": lists,
                        "tasks": tasks,
                        "members": members,
                    })
                })
                .collect();
            let value = serde_json::json!({
                "snapshot": path.display().to_string(),
                "stats": stats,
                "boards": boards,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}
