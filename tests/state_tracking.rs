//! Integration tests for network state tracking from a realistic server
//! conversation.

use proptest::prelude::*;
use slproxy::error::ParseError;
use slproxy::proto::{CaseMapping, Line};
use slproxy::state::NetworkState;

fn feed(state: &mut NetworkState, lines: &[&str]) {
    for text in lines {
        let line = Line::parse(text).unwrap();
        state.handle_line_at(&line, 1_700_000_000).unwrap();
    }
}

fn registered() -> NetworkState {
    let mut state = NetworkState::new("jelmer", "jvr", "localhost");
    feed(
        &mut state,
        &[
            ":irc.example.net 001 jelmer :Welcome to ExampleNet jelmer",
            ":irc.example.net 004 jelmer irc.example.net ircd-1.0 iowx beIklmnpst",
            ":irc.example.net 005 jelmer CHANTYPES=# PREFIX=(qov)~@+ CHANMODES=beI,k,l,mnpst NETWORK=ExampleNet :are supported by this server",
            ":irc.example.net 302 jelmer :jelmer=+jvr@example.org",
        ],
    );
    state
}

#[test]
fn test_registration_burst() {
    let state = registered();
    assert_eq!(state.me().nick(), "jelmer");
    assert_eq!(state.me().hostmask().as_deref(), Some("jelmer!jvr@example.org"));
    assert_eq!(state.info().name.as_deref(), Some("ExampleNet"));
    assert_eq!(state.info().server.as_deref(), Some("irc.example.net"));
    assert_eq!(state.info().prefix_modes, "qov");
}

#[test]
fn test_join_burst() {
    let mut state = registered();
    feed(
        &mut state,
        &[
            ":jelmer!jvr@example.org JOIN #rust",
            ":irc.example.net 332 jelmer #rust :Systems programming",
            ":irc.example.net 333 jelmer #rust alice!a@host 1600000000",
            ":irc.example.net 353 jelmer = #rust :~alice @bob +carol jelmer",
            ":irc.example.net 366 jelmer #rust :End of /NAMES list.",
            ":irc.example.net 324 jelmer #rust +ntl 50",
            ":irc.example.net 329 jelmer #rust 1500000000",
        ],
    );

    let channel = state.channel("#rust").unwrap();
    assert_eq!(channel.topic.as_deref(), Some("Systems programming"));
    assert_eq!(channel.topic_set_by.as_deref(), Some("alice!a@host"));
    assert_eq!(channel.topic_set_time, 1_600_000_000);
    assert_eq!(channel.creation_time, 1_500_000_000);
    assert_eq!(channel.member_count(), 4);
    assert!(channel.member("alice").unwrap().modes.contains('q'));
    assert!(channel.member("bob").unwrap().modes.contains('o'));
    assert!(channel.member("carol").unwrap().modes.contains('v'));
    assert_eq!(channel.mode_option('l').unwrap(), "50");
    assert!(channel.modes().contains('n'));
}

#[test]
fn test_conversation_updates_membership() {
    let mut state = registered();
    feed(
        &mut state,
        &[
            ":jelmer!jvr@example.org JOIN #rust",
            ":alice!a@host JOIN #rust",
            ":bob!b@host JOIN #rust",
            ":alice!a@host MODE #rust +o bob",
            ":bob!b@host KICK #rust alice :bye",
            ":bob!b@host NICK robert",
            ":robert!b@host TOPIC #rust :new topic",
        ],
    );

    let channel = state.channel("#rust").unwrap();
    assert!(!channel.contains("alice"));
    assert!(channel.contains("robert"));
    assert!(!channel.contains("bob"));
    assert!(channel.member("robert").unwrap().modes.contains('o'));
    assert_eq!(channel.topic.as_deref(), Some("new topic"));
    assert_eq!(channel.topic_set_by.as_deref(), Some("robert"));
    assert_eq!(channel.topic_set_time, 1_700_000_000);
    assert!(state.nick("alice").is_none());
}

#[test]
fn test_leaving_drops_channel() {
    let mut state = registered();
    feed(
        &mut state,
        &[
            ":jelmer!jvr@example.org JOIN #a,#b",
            ":alice!a@host JOIN #a",
            ":jelmer!jvr@example.org PART #a :later",
            ":op!o@host KICK #b jelmer",
        ],
    );
    assert_eq!(state.channel_count(), 0);
}

#[test]
fn test_short_lines_leave_state_untouched() {
    let mut state = registered();
    let before = state.clone();
    let err = state
        .handle_line(&Line::parse(":alice!a@host KICK #rust").unwrap())
        .unwrap_err();
    assert!(matches!(err, ParseError::NotEnoughArguments { .. }));
    assert_eq!(state, before);
}

#[test]
fn test_lookups_follow_casemapping() {
    let mut state = registered();
    feed(&mut state, &[":jelmer!jvr@example.org JOIN #Foo[1]"]);
    assert_eq!(state.info().casemapping, CaseMapping::Rfc1459);
    assert!(state.channel("#foo{1}").is_some());
    assert_eq!(state.channel("#FOO[1]").unwrap().name(), "#Foo[1]");
}

#[test]
fn test_short_numerics_are_rejected_not_applied() {
    for text in [
        ":srv 331 jelmer",
        ":srv 333 jelmer #rust alice",
        ":srv 367 jelmer #rust",
        ":srv 346 jelmer #rust",
        ":srv 348 jelmer #rust",
        ":alice!a@host NOTICE",
    ] {
        let mut state = registered();
        feed(&mut state, &[":jelmer!jvr@example.org JOIN #rust"]);
        let before = state.clone();
        let result = state.handle_line(&Line::parse(text).unwrap());
        assert!(
            matches!(result, Err(ParseError::NotEnoughArguments { .. })),
            "{} was accepted",
            text
        );
        assert_eq!(state, before);
    }
}

fn command_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "JOIN", "PART", "KICK", "QUIT", "NICK", "TOPIC", "MODE", "PRIVMSG", "NOTICE", "PING",
        "001", "004", "005", "221", "302", "305", "306", "315", "324", "329", "331", "332", "333",
        "346", "347", "348", "349", "352", "353", "366", "367", "368", "421", "999",
    ])
}

fn arg_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "", "#rust", "#rust,#tokio", "jelmer", "alice", "+o", "-o", "+kl", "-k", "+b",
            "=", "@alice jelmer", "jelmer=+jvr@host", "CASEMAPPING=ascii", "PREFIX=(ov)@+",
            "CHANMODES=b,k,l", "x", "1600000000", "H",
        ])
        .prop_map(str::to_owned),
        "[a-z#@+=!:,~-]{0,12}",
    ]
}

fn origin_strategy() -> impl Strategy<Value = Option<&'static str>> {
    prop::sample::select(vec![
        None,
        Some("irc.example.net"),
        Some("jelmer!jvr@example.org"),
        Some("alice!a@host"),
        Some("alice"),
    ])
}

proptest! {
    #[test]
    fn prop_accepted_lines_never_panic(
        origin in origin_strategy(),
        command in command_strategy(),
        args in prop::collection::vec(arg_strategy(), 0..9),
    ) {
        let mut state = registered();
        feed(
            &mut state,
            &[
                ":jelmer!jvr@example.org JOIN #rust",
                ":alice!a@host JOIN #rust",
            ],
        );
        let text = Line::new(origin, command, args).to_string();
        if let Ok(line) = Line::parse(&text) {
            let before = state.clone();
            if state.handle_line(&line).is_err() {
                prop_assert_eq!(&state, &before);
            }
        }
    }
}
