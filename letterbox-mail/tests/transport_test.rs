//! `SmtpTransport` against a local scripted SMTP server.

use letterbox_mail::{
    EmailContent, MailComposer, Message, SenderAccount, SmtpConfig, SmtpSecurity, SmtpTransport,
    SubmitError, Transport, classify_submission,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// When the fake server hangs up.
#[derive(Clone, Copy, PartialEq)]
enum HangUp {
    /// Answer QUIT normally.
    Never,
    /// Close right after replying 250 to the message data.
    AfterAccept,
    /// Close right after the 354 go-ahead, before any data is accepted.
    BeforeAccept,
}

/// Serve one SMTP session on a random local port.
async fn fake_server(hang_up: HangUp) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        write.write_all(b"220 fake.local ESMTP\r\n").await.unwrap();

        let mut in_data = false;
        while let Ok(Some(line)) = lines.next_line().await {
            if in_data {
                if line == "." {
                    in_data = false;
                    write.write_all(b"250 2.0.0 queued\r\n").await.unwrap();
                    if hang_up == HangUp::AfterAccept {
                        return;
                    }
                }
                continue;
            }

            let verb = line
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            let reply: &[u8] = match verb.as_str() {
                "EHLO" => b"250-fake.local\r\n250-8BITMIME\r\n250 AUTH PLAIN LOGIN\r\n",
                "AUTH" => b"235 2.7.0 accepted\r\n",
                "MAIL" | "RCPT" => b"250 2.1.0 ok\r\n",
                "DATA" => {
                    in_data = true;
                    b"354 go ahead\r\n"
                }
                "QUIT" => b"221 2.0.0 bye\r\n",
                _ => b"502 5.5.2 unknown command\r\n",
            };
            write.write_all(reply).await.unwrap();

            if verb == "QUIT" || (verb == "DATA" && hang_up == HangUp::BeforeAccept) {
                return;
            }
        }
    });

    port
}

async fn submit(port: u16) -> Result<(), SubmitError> {
    let transport = SmtpTransport::new(
        SmtpConfig::new("127.0.0.1")
            .port(port)
            .security(SmtpSecurity::None)
            .timeout(Duration::from_secs(5)),
    );
    let account = SenderAccount::new("ops@example.com", "pw");
    let message: Message = MailComposer::new("Letterbox")
        .compose(
            &account,
            "reader@example.org",
            &EmailContent::new("Hello", "<p>hi</p>"),
        )
        .await
        .unwrap();

    transport.submit(&account, &message).await
}

#[tokio::test]
async fn test_clean_session_is_delivered() {
    let port = fake_server(HangUp::Never).await;
    let result = submit(port).await;

    assert_eq!(result, Ok(()));
    assert!(classify_submission(&result).is_success());
}

#[tokio::test]
async fn test_close_after_accept_counts_as_delivered() {
    let port = fake_server(HangUp::AfterAccept).await;
    let result = submit(port).await;

    assert!(
        matches!(result, Err(SubmitError::Disconnected { accepted: true, .. })),
        "{result:?}"
    );
    assert!(classify_submission(&result).is_success());
}

#[tokio::test]
async fn test_close_before_accept_is_a_failure() {
    let port = fake_server(HangUp::BeforeAccept).await;
    let result = submit(port).await;

    assert!(result.is_err());
    assert!(
        !matches!(result, Err(SubmitError::Disconnected { accepted: true, .. })),
        "{result:?}"
    );
    assert!(!classify_submission(&result).is_success());
}
