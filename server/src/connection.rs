use std::sync::Arc;

use log::info;
use protocol::frame::FrameReader;
use protocol::join::JoinCommand;
use protocol::messages::{self, ERROR_LINE};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;

use crate::broker::Broker;
use crate::client_handle::ClientHandle;
use crate::room::Room;

/// Drives one connection through the state machine in spec §4.6:
/// read → handshake → register → loop(read/broadcast) → on error/EOF
/// deregister and announce departure.
pub async fn handle_connection(stream: TcpStream, broker: Arc<Broker>) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half);
    let handle = ClientHandle::new(write_half);

    let first_frame = match reader.read_frame().await {
        Ok(Some(frame)) => frame,
        Ok(None) | Err(_) => {
            // EOF before a JOIN was ever sent, a read error, or an
            // oversize first frame: no membership state exists yet, but
            // the handshake still gets the unconditional ERROR\n write
            // spec §4.6's FAIL_EARLY calls for.
            fail_early(&handle).await;
            return;
        }
    };

    let join = match JoinCommand::parse(trim_newline(&first_frame)) {
        Ok(join) => join,
        Err(_) => {
            fail_early(&handle).await;
            return;
        }
    };

    let room = match broker.join(&join.room, handle.clone()).await {
        Ok(room) => room,
        Err(_) => {
            fail_early(&handle).await;
            return;
        }
    };

    info!(
        "{} joined room '{}'",
        String::from_utf8_lossy(&join.nick),
        String::from_utf8_lossy(&join.room)
    );
    room.broadcast(&messages::join_announcement(&join.nick)).await;

    run_active_loop(&mut reader, &room, &join.nick).await;

    broker.leave(&join.room, &room, &handle).await;
    room.broadcast(&messages::leave_announcement(&join.nick))
        .await;
    info!(
        "{} left room '{}'",
        String::from_utf8_lossy(&join.nick),
        String::from_utf8_lossy(&join.room)
    );
}

async fn run_active_loop(reader: &mut FrameReader<OwnedReadHalf>, room: &Room, nick: &[u8]) {
    loop {
        match reader.read_frame().await {
            Ok(Some(frame)) => {
                let line = trim_newline(&frame);
                if line.is_empty() {
                    continue; // empty frames are dropped silently (spec §4.1)
                }

                // `line` is an opaque byte string (spec §4.2/§6) — it is
                // broadcast as-is, never required to be valid UTF-8.
                room.broadcast(&messages::user_line(nick, line)).await;
            }
            Ok(None) | Err(_) => return, // EOF, read error, or oversize frame -> LEAVE
        }
    }
}

async fn fail_early(handle: &ClientHandle) {
    let _ = handle.write(ERROR_LINE).await;
}

fn trim_newline(frame: &[u8]) -> &[u8] {
    frame.strip_suffix(b"\n").unwrap_or(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn connect_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, (server, _)) =
            tokio::join!(TcpStream::connect(addr), async { listener.accept().await.unwrap() });
        (client.unwrap(), server)
    }

    #[tokio::test]
    async fn two_users_exchange_a_message() {
        let broker = Arc::new(Broker::new());

        let (mut c1, s1) = connect_pair().await;
        let (mut c2, s2) = connect_pair().await;

        c1.write_all(b"JOIN cooking alice\n").await.unwrap();
        c2.write_all(b"JOIN cooking bob\n").await.unwrap();

        let t1 = tokio::spawn(handle_connection(s1, broker.clone()));
        let t2 = tokio::spawn(handle_connection(s2, broker.clone()));

        let mut buf = [0u8; 256];

        // alice sees her own join announcement, then bob's.
        let n = c1.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"alice has joined\n");
        let n = c1.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"bob has joined\n");

        // bob only sees his own join.
        let n = c2.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"bob has joined\n");

        c1.write_all(b"hello\n").await.unwrap();

        let n = c2.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"alice: hello\n");
        let n = c1.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"alice: hello\n");

        drop(c1);
        let n = c2.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"alice has left\n");

        drop(c2);
        t1.await.unwrap();
        t2.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_join_gets_error_and_close() {
        let broker = Arc::new(Broker::new());
        let (mut client, server) = connect_pair().await;

        client.write_all(b"HELLO r u\n").await.unwrap();
        handle_connection(server, broker.clone()).await;

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ERROR\n");

        // No room was ever created from the malformed attempt.
        assert!(broker.join(b"r", dummy_handle().await).await.is_ok());
    }

    #[tokio::test]
    async fn merged_packets_are_broadcast_in_order() {
        let broker = Arc::new(Broker::new());

        let (mut observer_client, observer_server) = connect_pair().await;
        observer_client.write_all(b"JOIN r obs\n").await.unwrap();
        let obs_task = tokio::spawn(handle_connection(observer_server, broker.clone()));

        let mut buf = [0u8; 256];
        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"obs has joined\n");

        let (mut sender_client, sender_server) = connect_pair().await;
        sender_client
            .write_all(b"JOIN r u\nhi\nbye\n")
            .await
            .unwrap();
        let task = tokio::spawn(handle_connection(sender_server, broker.clone()));

        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"u has joined\n");
        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"u: hi\n");
        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"u: bye\n");

        drop(sender_client);
        drop(observer_client);
        task.await.unwrap();
        obs_task.await.unwrap();
    }

    #[tokio::test]
    async fn oversize_frame_closes_and_announces_departure() {
        let broker = Arc::new(Broker::new());

        let (mut observer_client, observer_server) = connect_pair().await;
        observer_client.write_all(b"JOIN r obs\n").await.unwrap();
        let obs_task = tokio::spawn(handle_connection(observer_server, broker.clone()));

        let mut buf = [0u8; 256];
        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"obs has joined\n");

        let (mut sender_client, sender_server) = connect_pair().await;
        sender_client.write_all(b"JOIN r flooder\n").await.unwrap();
        let task = tokio::spawn(handle_connection(sender_server, broker.clone()));

        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"flooder has joined\n");

        sender_client
            .write_all(&vec![b'a'; protocol::MAX_FRAME + 1])
            .await
            .unwrap();

        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"flooder has left\n");

        drop(sender_client);
        drop(observer_client);
        task.await.unwrap();
        obs_task.await.unwrap();
    }

    #[tokio::test]
    async fn non_utf8_payload_is_broadcast_byte_for_byte() {
        // The wire protocol is byte-transparent (spec §6) — a payload
        // line containing non-UTF-8 bytes must reach other members
        // untouched, not be treated as a broken connection.
        let broker = Arc::new(Broker::new());

        let (mut observer_client, observer_server) = connect_pair().await;
        observer_client.write_all(b"JOIN r obs\n").await.unwrap();
        let obs_task = tokio::spawn(handle_connection(observer_server, broker.clone()));

        let mut buf = [0u8; 256];
        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"obs has joined\n");

        let (mut sender_client, sender_server) = connect_pair().await;
        sender_client.write_all(b"JOIN r u\n").await.unwrap();
        let task = tokio::spawn(handle_connection(sender_server, broker.clone()));

        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"u has joined\n");

        let mut line = b"bin\xFFary\xFE".to_vec();
        line.push(b'\n');
        sender_client.write_all(&line).await.unwrap();

        let n = observer_client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"u: bin\xFFary\xFE\n");

        drop(sender_client);
        drop(observer_client);
        task.await.unwrap();
        obs_task.await.unwrap();
    }

    #[tokio::test]
    async fn eof_before_join_still_gets_an_error_line() {
        let broker = Arc::new(Broker::new());
        let (mut client, server) = connect_pair().await;

        // Close the write side without ever sending a JOIN.
        client.shutdown().await.unwrap();
        handle_connection(server, broker).await;

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ERROR\n");
    }

    async fn dummy_handle() -> ClientHandle {
        let (_client, server) = connect_pair().await;
        let (_r, w) = server.into_split();
        ClientHandle::new(w)
    }
}
