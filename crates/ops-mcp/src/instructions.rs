//! Server instructions sent to the agent on initialize

/// Build the instructions text, including the shortcut behaviors the agent
/// composes from individual tools.
pub fn server_instructions(github_owner: &str, zentao_enabled: bool) -> String {
    let mut text = String::from(
        "DevOps Agent: GitHub, Slack and ZenTao tools in one server.\n\
         Query commits, pull requests, issues and files on GitHub, post messages \
         and task cards to Slack, and manage ZenTao bugs, tasks and stories.\n",
    );
    if !github_owner.is_empty() {
        text.push_str(&format!("Default GitHub owner: {}\n", github_owner));
    }
    if !zentao_enabled {
        text.push_str("ZenTao is not configured; zentao_* tools are unavailable.\n");
    }

    text.push_str(
        "\n## Shortcuts (natural language → tool sequence)\n\
         Each step is an independent tool call. A failed step does not undo earlier \
         ones; report every step's outcome to the user.\n\
         \n\
         ### 1. Create requirement (创建需求 / 提需求 / 需求给XX)\n\
         1) github_create_issue with label enhancement, assigned to the named person\n\
         2) slack_send_message with the title, assignee and issue link\n\
         \n\
         ### 2. Report bug (提Bug / 报Bug / 发现Bug)\n\
         1) github_create_issue with label bug, assigned to the named person\n\
         2) slack_send_message with the bug summary and issue link\n\
         3) zentao_create_bug when ZenTao is configured\n\
         \n\
         ### 3. Assign task (创建任务 / 派任务 / 任务给XX)\n\
         1) slack_create_task with assignee and priority\n\
         2) github_create_issue with label task\n\
         \n\
         ### 4. Check progress (查看进度 / 项目状态 / 最近提交)\n\
         1) github_get_commits for recent commits\n\
         2) github_get_issues and github_get_pull_requests for open items\n\
         3) slack_send_message with the summary\n\
         \n\
         ### 5. Notify team (通知团队 / 发布通知 / 广播)\n\
         1) slack_send_message to the default channel\n\
         \n\
         ### 6. Review changes (代码审查 / 看看改了什么)\n\
         1) github_get_commits for recent commits\n\
         2) github_get_commit_diff for the diff of each relevant commit\n\
         \n\
         ## General rules\n\
         - Match people's names to GitHub logins when assigning.\n\
         - Send a Slack notification alongside write operations unless told otherwise.\n\
         - Use the default owner's repository when none is named.\n\
         - Default priority is 普通.\n\
         - Slack notifications carry a summary of the operation and its links.\n",
    );
    text
}
