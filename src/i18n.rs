use std::collections::HashMap;

pub struct I18n {
    translations: HashMap<String, HashMap<String, String>>,
    current_lang: String,
}

impl I18n {
    pub fn new(lang: &str) -> Self {
        let mut translations = HashMap::new();

        // 英文
        let mut en = HashMap::new();
        en.insert("help_about".to_string(), "Run common Linux utilities through typed wrappers and keep a history of every attempt".to_string());
        en.insert("help_title".to_string(), "Available commands:".to_string());
        en.insert("help_builtin_help".to_string(), "Show commands, or the arguments of one command".to_string());
        en.insert("help_builtin_history".to_string(), "Show this session's history (--json for raw records, --limit N)".to_string());
        en.insert("help_builtin_exit".to_string(), "Leave the shell".to_string());
        en.insert("help_label_usage".to_string(), "Usage:".to_string());
        en.insert("help_label_arguments".to_string(), "Arguments:".to_string());

        // Catalog entries
        en.insert("entry_ls".to_string(), "List directory contents".to_string());
        en.insert("entry_pwd".to_string(), "Print the working directory".to_string());
        en.insert("entry_cd".to_string(), "Change the working directory".to_string());
        en.insert("entry_mkdir".to_string(), "Create a directory".to_string());
        en.insert("entry_touch".to_string(), "Create a file or update its timestamp".to_string());
        en.insert("entry_rm".to_string(), "Remove a file or directory".to_string());
        en.insert("entry_chmod".to_string(), "Change file permissions".to_string());
        en.insert("entry_chown".to_string(), "Change file owner and group".to_string());
        en.insert("entry_ps".to_string(), "List processes".to_string());
        en.insert("entry_kill".to_string(), "Send a signal to a process".to_string());
        en.insert("entry_grep".to_string(), "Search file contents".to_string());
        en.insert("entry_find".to_string(), "Find files by name, type or depth".to_string());
        en.insert("entry_top".to_string(), "Snapshot of running processes".to_string());
        en.insert("entry_free".to_string(), "Show memory usage".to_string());
        en.insert("entry_whoami".to_string(), "Print the current user name".to_string());

        // Shell messages
        en.insert("shell_welcome".to_string(), "lcat shell. Type 'help' to list commands, 'exit' to quit.".to_string());
        en.insert("shell_unknown".to_string(), "Unknown command: {0} (type 'help' to list commands)".to_string());
        en.insert("shell_parse_error".to_string(), "Cannot parse input: {0}".to_string());
        en.insert("shell_bye".to_string(), "Bye".to_string());
        en.insert("shell_interrupted".to_string(), "Interrupted".to_string());

        // Result output
        en.insert("result_ok".to_string(), "{0} (exit code: {1}, {2}ms)".to_string());
        en.insert("result_failed".to_string(), "{0} failed (exit code: {1}, {2}ms)".to_string());
        en.insert("result_timeout".to_string(), "{0} timed out ({1}ms)".to_string());
        en.insert("result_launch_failed".to_string(), "{0} could not be started".to_string());
        en.insert("stdout".to_string(), "Standard output:".to_string());
        en.insert("stderr".to_string(), "Error output:".to_string());
        en.insert("summary".to_string(), "Summary:".to_string());

        // History
        en.insert("history_empty".to_string(), "No commands run yet".to_string());
        en.insert("history_header".to_string(), "History (showing {0} of {1}):".to_string());
        en.insert("history_status_ok".to_string(), "ok".to_string());
        en.insert("history_status_failed".to_string(), "failed".to_string());
        en.insert("history_status_timeout".to_string(), "timeout".to_string());
        en.insert("history_status_launch".to_string(), "not started".to_string());

        // Error messages
        en.insert("error_read_input".to_string(), "Failed to read input".to_string());
        en.insert("error_write_output".to_string(), "Failed to write output".to_string());

        // 中文
        let mut zh = HashMap::new();
        zh.insert("help_about".to_string(), "通过类型化封装运行常用 Linux 工具，并记录每次执行".to_string());
        zh.insert("help_title".to_string(), "可用命令:".to_string());
        zh.insert("help_builtin_help".to_string(), "显示命令列表，或某个命令的参数".to_string());
        zh.insert("help_builtin_history".to_string(), "显示本次会话的历史 (--json 输出原始记录, --limit N)".to_string());
        zh.insert("help_builtin_exit".to_string(), "退出".to_string());
        zh.insert("help_label_usage".to_string(), "用法:".to_string());
        zh.insert("help_label_arguments".to_string(), "参数:".to_string());

        zh.insert("entry_ls".to_string(), "列出目录内容".to_string());
        zh.insert("entry_pwd".to_string(), "显示当前工作目录".to_string());
        zh.insert("entry_cd".to_string(), "切换工作目录".to_string());
        zh.insert("entry_mkdir".to_string(), "创建目录".to_string());
        zh.insert("entry_touch".to_string(), "创建文件或更新时间戳".to_string());
        zh.insert("entry_rm".to_string(), "删除文件或目录".to_string());
        zh.insert("entry_chmod".to_string(), "修改文件权限".to_string());
        zh.insert("entry_chown".to_string(), "修改文件所有者和组".to_string());
        zh.insert("entry_ps".to_string(), "列出进程".to_string());
        zh.insert("entry_kill".to_string(), "向进程发送信号".to_string());
        zh.insert("entry_grep".to_string(), "搜索文件内容".to_string());
        zh.insert("entry_find".to_string(), "按名称、类型或深度查找文件".to_string());
        zh.insert("entry_top".to_string(), "进程快照".to_string());
        zh.insert("entry_free".to_string(), "显示内存使用情况".to_string());
        zh.insert("entry_whoami".to_string(), "显示当前用户名".to_string());

        zh.insert("shell_welcome".to_string(), "lcat 交互模式。输入 'help' 查看命令，'exit' 退出。".to_string());
        zh.insert("shell_unknown".to_string(), "未知命令: {0} (输入 'help' 查看命令)".to_string());
        zh.insert("shell_parse_error".to_string(), "无法解析输入: {0}".to_string());
        zh.insert("shell_bye".to_string(), "再见".to_string());
        zh.insert("shell_interrupted".to_string(), "已中断".to_string());

        zh.insert("result_ok".to_string(), "{0} (退出码: {1}, {2}ms)".to_string());
        zh.insert("result_failed".to_string(), "{0} 执行失败 (退出码: {1}, {2}ms)".to_string());
        zh.insert("result_timeout".to_string(), "{0} 执行超时 ({1}ms)".to_string());
        zh.insert("result_launch_failed".to_string(), "{0} 无法启动".to_string());
        zh.insert("stdout".to_string(), "标准输出:".to_string());
        zh.insert("stderr".to_string(), "错误输出:".to_string());
        zh.insert("summary".to_string(), "摘要:".to_string());

        zh.insert("history_empty".to_string(), "还没有执行任何命令".to_string());
        zh.insert("history_header".to_string(), "历史记录 (显示 {0} / {1}):".to_string());
        zh.insert("history_status_ok".to_string(), "成功".to_string());
        zh.insert("history_status_failed".to_string(), "失败".to_string());
        zh.insert("history_status_timeout".to_string(), "超时".to_string());
        zh.insert("history_status_launch".to_string(), "未启动".to_string());

        zh.insert("error_read_input".to_string(), "读取输入失败".to_string());
        zh.insert("error_write_output".to_string(), "写入输出失败".to_string());

        translations.insert("en".to_string(), en);
        translations.insert("zh".to_string(), zh);

        // 确定语言 - 支持多种语言代码格式
        let effective_lang = if lang.starts_with("zh") || lang == "cn" || lang == "chinese" {
            "zh"
        } else {
            "en"
        };

        Self {
            translations,
            current_lang: effective_lang.to_string(),
        }
    }

    pub fn t(&self, key: &str) -> String {
        if let Some(lang_map) = self.translations.get(&self.current_lang) {
            if let Some(value) = lang_map.get(key) {
                return value.clone();
            }
        }
        key.to_string()
    }

    /// Fill `{N}` placeholders in one pass; text inside arguments is never rescanned.
    pub fn t_format(&self, key: &str, args: &[&str]) -> String {
        let template = self.t(key);
        let mut result = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some(open) = rest.find('{') {
            result.push_str(&rest[..open]);
            let tail = &rest[open + 1..];
            let arg = tail.split_once('}').and_then(|(index, _)| {
                index.parse::<usize>().ok().and_then(|i| args.get(i)).map(|arg| (index.len(), *arg))
            });
            match arg {
                Some((len, arg)) => {
                    result.push_str(arg);
                    rest = &tail[len + 1..];
                }
                None => {
                    result.push('{');
                    rest = tail;
                }
            }
        }
        result.push_str(rest);
        result
    }
}
