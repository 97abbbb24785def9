//! The candidate-folder listing shown to the model.

use std::collections::HashMap;

use crate::email::host::Account;

use super::address::FolderAddress;

/// Formats the candidate folders grouped by account.
///
/// Accounts appear in first-seen order of `folders`; folders of accounts that
/// are not in `accounts` are left out. Each group is a `Mailbox:` header, one
/// `display-name - path` line per folder and a trailing blank line.
pub fn format_folder_catalogue(folders: &[FolderAddress], accounts: &[Account]) -> String {
    let names: HashMap<&str, &str> = accounts
        .iter()
        .map(|account| (account.id.as_str(), account.name.as_str()))
        .collect();

    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for folder in folders {
        match groups
            .iter_mut()
            .find(|(account_id, _)| *account_id == folder.account_id())
        {
            Some((_, paths)) => paths.push(folder.path()),
            None => groups.push((folder.account_id(), vec![folder.path()])),
        }
    }

    let mut lines = Vec::new();
    for (account_id, paths) in groups {
        let Some(name) = names.get(account_id) else {
            continue;
        };
        lines.push(format!("Mailbox: {}", name));
        for path in paths {
            lines.push(format!("  └─ {} - {}", name, path));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, name: &str) -> Account {
        Account {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_groups_by_account_in_first_seen_order() {
        let folders = vec![
            FolderAddress::parse("acct2|/Work"),
            FolderAddress::parse("acct1|/Invoices"),
            FolderAddress::parse("acct2|/Private"),
        ];
        let accounts = vec![
            account("acct1", "me@example.com"),
            account("acct2", "work@example.org"),
        ];

        let catalogue = format_folder_catalogue(&folders, &accounts);
        assert_eq!(
            catalogue,
            "Mailbox: work@example.org\n  └─ work@example.org - /Work\n  └─ work@example.org - /Private\n\nMailbox: me@example.com\n  └─ me@example.com - /Invoices\n"
        );
    }

    #[test]
    fn test_unknown_accounts_are_skipped() {
        let folders = vec![FolderAddress::parse("ghost|/Work")];
        let catalogue = format_folder_catalogue(&folders, &[account("acct1", "me@example.com")]);
        assert!(catalogue.is_empty());
    }

    #[test]
    fn test_catalogue_never_shows_account_ids() {
        let folders = vec![FolderAddress::parse("account1|/Inbox")];
        let catalogue = format_folder_catalogue(&folders, &[account("account1", "me@example.com")]);
        assert!(!catalogue.contains("account1|"));
        assert!(catalogue.contains("me@example.com - /Inbox"));
    }
}
