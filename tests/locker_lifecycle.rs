use std::fs;

use locker::format::{self, MAGIC_LEN, VERSION_LEN};
use locker::{
    Account, ApiKey, ErrorKind, ITEM_CONTENT_MAX_LEN, ITEM_DESCRIPTION_MAX_LEN,
    ITEM_KEY_MAX_LEN, Locker, LockerDir, LockerError, Note, PASSWORD_MAX_LEN, URL_MAX_LEN,
    USERNAME_MAX_LEN,
};
use tempfile::{TempDir, tempdir};
use zeroize::Zeroizing;

fn pass(s: &str) -> Zeroizing<String> {
    Zeroizing::new(s.to_string())
}

fn setup() -> (TempDir, LockerDir, Locker) {
    let tmp = tempdir().unwrap();
    let dir = LockerDir::new(tmp.path());
    let locker = Locker::create(&dir, "Work", pass("pw")).unwrap();
    (tmp, dir, locker)
}

fn keys(locker: &Locker, query: &str) -> Vec<String> {
    locker
        .items(query)
        .unwrap()
        .into_iter()
        .map(|i| i.key)
        .collect()
}

#[test]
fn created_locker_opens_empty() {
    let tmp = tempdir().unwrap();
    let dir = LockerDir::new(tmp.path());

    let longest = "x".repeat(64);
    for name in ["a", "Work", "My Bank 2", longest.as_str()] {
        Locker::create(&dir, name, pass("correct horse")).unwrap();
        let locker = Locker::open(&dir, name, pass("correct horse")).unwrap();
        assert!(locker.items("").unwrap().is_empty());
        assert!(!locker.is_modified());
        locker.close().unwrap();
    }
}

#[test]
fn wrong_passphrase_is_authentication_error() {
    let (_tmp, dir, locker) = setup();
    locker.close().unwrap();

    for wrong in ["PW", "pw ", "p", "something else"] {
        let err = Locker::open(&dir, "Work", pass(wrong)).err().unwrap();
        assert!(matches!(err, LockerError::InvalidPassphrase));
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    Locker::open(&dir, "Work", pass("pw")).unwrap();
}

#[test]
fn every_save_uses_a_new_nonce() {
    let (_tmp, _dir, mut locker) = setup();
    let path = locker.path().to_path_buf();

    let nonce_of = |bytes: &[u8]| *format::parse_header(bytes).unwrap().nonce();

    let created = nonce_of(&fs::read(&path).unwrap());
    locker.save().unwrap();
    let first = fs::read(&path).unwrap();
    locker.save().unwrap();
    let second = fs::read(&path).unwrap();

    assert_ne!(created, nonce_of(&first));
    assert_ne!(nonce_of(&first), nonce_of(&second));
    assert_ne!(first, second);
}

#[test]
fn item_keys_are_unique() {
    let (_tmp, _dir, mut locker) = setup();

    let github = locker.add_apikey(&ApiKey::new("github", "", "a")).unwrap();
    let gitlab = locker.add_apikey(&ApiKey::new("gitlab", "", "b")).unwrap();

    assert!(matches!(
        locker.add_apikey(&ApiKey::new("github", "", "c")),
        Err(LockerError::ItemKeyExists(_))
    ));
    assert!(matches!(
        locker.add_account(&Account::new("github", "", "u", "p", "")),
        Err(LockerError::ItemKeyExists(_))
    ));

    // case-sensitive
    locker.add_apikey(&ApiKey::new("GitHub", "", "d")).unwrap();

    assert!(matches!(
        locker.update_apikey(gitlab, &ApiKey::new("github", "", "b")),
        Err(LockerError::ItemKeyExists(_))
    ));

    locker
        .update_apikey(github, &ApiKey::new("github", "new description", "a2"))
        .unwrap();
    assert_eq!(locker.get_apikey(github).unwrap().value(), "a2");

    let bank = locker
        .add_account(&Account::new("bank", "", "alice", "p1", ""))
        .unwrap();
    assert!(matches!(
        locker.update_account(bank, &Account::new("gitlab", "", "alice", "p1", "")),
        Err(LockerError::ItemKeyExists(_))
    ));
    locker
        .update_account(bank, &Account::new("bank", "", "alice", "p2", ""))
        .unwrap();
    locker
        .update_account(bank, &Account::new("bank-eu", "", "alice", "p2", ""))
        .unwrap();

    let account = locker.get_account(bank).unwrap();
    assert_eq!(account.key(), "bank-eu");
    assert_eq!(account.password(), "p2");
    assert!(matches!(
        locker.item_by_key("bank"),
        Err(LockerError::ItemKeyNotFound(_))
    ));

    let todo = locker.add_note(&Note::new("todo", "", "milk")).unwrap();
    assert!(matches!(
        locker.update_note(todo, &Note::new("bank-eu", "", "milk")),
        Err(LockerError::ItemKeyExists(_))
    ));
}

#[test]
fn length_limits_are_inclusive() {
    let (_tmp, _dir, mut locker) = setup();

    let key = "k".repeat(ITEM_KEY_MAX_LEN);
    locker.add_apikey(&ApiKey::new(key.as_str(), "", "v")).unwrap();
    assert!(matches!(
        locker.add_apikey(&ApiKey::new("k".repeat(ITEM_KEY_MAX_LEN + 1), "", "v")),
        Err(LockerError::ItemKeyTooLong { .. })
    ));

    locker
        .add_apikey(&ApiKey::new("d1", "d".repeat(ITEM_DESCRIPTION_MAX_LEN), "v"))
        .unwrap();
    assert!(matches!(
        locker.add_apikey(&ApiKey::new("d2", "d".repeat(ITEM_DESCRIPTION_MAX_LEN + 1), "v")),
        Err(LockerError::ItemDescriptionTooLong { .. })
    ));

    locker
        .add_apikey(&ApiKey::new("v1", "", "v".repeat(ITEM_CONTENT_MAX_LEN)))
        .unwrap();
    assert!(matches!(
        locker.add_apikey(&ApiKey::new("v2", "", "v".repeat(ITEM_CONTENT_MAX_LEN + 1))),
        Err(LockerError::ContentTooLong { .. })
    ));

    let u = "u".repeat(USERNAME_MAX_LEN);
    let p = "p".repeat(PASSWORD_MAX_LEN);
    let w = "w".repeat(URL_MAX_LEN);
    locker
        .add_account(&Account::new("a1", "", u.as_str(), p.as_str(), w.as_str()))
        .unwrap();

    assert!(matches!(
        locker.add_account(&Account::new("a2", "", u.clone() + "u", "", "")),
        Err(LockerError::AccountUsernameTooLong { .. })
    ));
    assert!(matches!(
        locker.add_account(&Account::new("a2", "", "", p.clone() + "p", "")),
        Err(LockerError::AccountPasswordTooLong { .. })
    ));
    assert!(matches!(
        locker.add_account(&Account::new("a2", "", "", "", w.clone() + "w")),
        Err(LockerError::AccountUrlTooLong { .. })
    ));

    // same limits on the update path
    let a1 = locker.item_by_key("a1").unwrap().id;
    assert!(matches!(
        locker.update_account(a1, &Account::new("a1", "", u.clone() + "u", "", "")),
        Err(LockerError::AccountUsernameTooLong { .. })
    ));
    assert!(matches!(
        locker.update_account(a1, &Account::new("a1", "", "", p.clone() + "p", "")),
        Err(LockerError::AccountPasswordTooLong { .. })
    ));
    assert!(matches!(
        locker.update_account(a1, &Account::new("a1", "", "", "", w.clone() + "w")),
        Err(LockerError::AccountUrlTooLong { .. })
    ));
    assert!(matches!(
        locker.update_account(a1, &Account::new("k".repeat(ITEM_KEY_MAX_LEN + 1), "", "", "", "")),
        Err(LockerError::ItemKeyTooLong { .. })
    ));
    assert_eq!(locker.get_account(a1).unwrap().username(), u);

    locker
        .add_note(&Note::new("n1", "", "n".repeat(ITEM_CONTENT_MAX_LEN)))
        .unwrap();
    assert!(matches!(
        locker.add_note(&Note::new("n2", "", "n".repeat(ITEM_CONTENT_MAX_LEN + 1))),
        Err(LockerError::ContentTooLong { .. })
    ));
}

#[test]
fn account_fields_survive_save_and_open() {
    let (_tmp, dir, mut locker) = setup();

    let cases = [
        ("alice", "hunter2", "https://bank.example"),
        ("", "", ""),
        ("trailing ", "spaces\t\t", "x "),
        ("ünïcödé", "пароль", "https://例え.jp/パス"),
    ];

    let mut ids = Vec::new();
    for (i, (username, password, url)) in cases.iter().enumerate() {
        let item = Account::new(format!("acc{i}"), "", *username, *password, *url);
        ids.push(locker.add_account(&item).unwrap());
    }
    locker.save().unwrap();
    locker.close().unwrap();

    let locker = Locker::open(&dir, "Work", pass("pw")).unwrap();
    for (id, (username, password, url)) in ids.into_iter().zip(cases) {
        let account = locker.get_account(id).unwrap();
        assert_eq!(account.username(), username);
        assert_eq!(account.password(), password);
        assert_eq!(account.url(), url);
        assert!(account.created_at().is_some());
    }
}

#[test]
fn notes_survive_save_and_open() {
    let (_tmp, dir, mut locker) = setup();

    let id = locker
        .add_note(&Note::new("todo", "errands", "buy milk\nand eggs"))
        .unwrap();
    locker.save().unwrap();
    locker.close().unwrap();

    let mut locker = Locker::open(&dir, "Work", pass("pw")).unwrap();
    let note = locker.get_note(id).unwrap();
    assert_eq!(note.key(), "todo");
    assert_eq!(note.description(), "errands");
    assert_eq!(note.text(), "buy milk\nand eggs");

    locker
        .update_note(id, &Note::new("todo", "errands", "done"))
        .unwrap();
    assert!(locker.is_modified());
    locker.save().unwrap();
    locker.close().unwrap();

    let locker = Locker::open(&dir, "Work", pass("pw")).unwrap();
    assert_eq!(locker.get_note(id).unwrap().text(), "done");
    assert!(matches!(
        locker.get_apikey(id),
        Err(LockerError::ItemTypeMismatch { .. })
    ));
}

#[test]
fn search_filter_matches_substrings_in_key_order() {
    let (_tmp, _dir, mut locker) = setup();

    for key in ["aws-prod", "aws-dev", "github"] {
        locker.add_apikey(&ApiKey::new(key, "", "v")).unwrap();
    }

    assert_eq!(keys(&locker, "aws"), ["aws-dev", "aws-prod"]);
    assert_eq!(keys(&locker, ""), ["aws-dev", "aws-prod", "github"]);
    assert_eq!(keys(&locker, "AWS"), Vec::<String>::new());
}

#[test]
fn corrupted_magic_is_rejected_and_skipped() {
    let tmp = tempdir().unwrap();
    let dir = LockerDir::new(tmp.path());

    for name in ["Alpha", "Bravo", "Charlie"] {
        Locker::create(&dir, name, pass("pw")).unwrap();
    }

    let bravo = dir.lockers_path().join("bravo.locker");
    let mut data = fs::read(&bravo).unwrap();
    data[VERSION_LEN + MAGIC_LEN - 1] ^= 0xff;
    fs::write(&bravo, &data).unwrap();

    assert_eq!(dir.list_names().unwrap(), ["Alpha", "Charlie"]);

    let err = Locker::open(&dir, "Bravo", pass("pw")).err().unwrap();
    assert!(matches!(err, LockerError::MalformedHeader));
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn tampered_ciphertext_looks_like_wrong_passphrase() {
    let (_tmp, dir, locker) = setup();
    let path = locker.path().to_path_buf();
    locker.close().unwrap();

    let mut data = fs::read(&path).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0x01;
    fs::write(&path, &data).unwrap();

    assert!(matches!(
        Locker::open(&dir, "Work", pass("pw")),
        Err(LockerError::InvalidPassphrase)
    ));
}

#[test]
fn unsupported_version_is_reported() {
    let (_tmp, dir, locker) = setup();
    let path = locker.path().to_path_buf();
    locker.close().unwrap();

    let mut data = fs::read(&path).unwrap();
    data[..VERSION_LEN].copy_from_slice(&7u32.to_le_bytes());
    fs::write(&path, &data).unwrap();

    assert!(matches!(
        Locker::open(&dir, "Work", pass("pw")),
        Err(LockerError::UnsupportedVersion(7))
    ));
}

#[test]
fn open_rejects_invalid_names_before_touching_disk() {
    let tmp = tempdir().unwrap();
    let dir = LockerDir::new(tmp.path());

    assert!(matches!(
        Locker::open(&dir, "../etc/passwd", pass("pw")),
        Err(LockerError::NameForbiddenChar('.'))
    ));
    assert!(matches!(
        Locker::open(&dir, "", pass("pw")),
        Err(LockerError::NameEmpty)
    ));
}
