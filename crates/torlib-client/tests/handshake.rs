//! Run SOCKS4a handshakes against a fake proxy on a mock network.

use futures::future::FutureExt;
use futures::io::{AsyncReadExt, AsyncWriteExt};
use hex_literal::hex;
use std::io::ErrorKind;
use std::net::Ipv4Addr;
use torlib_client::{Error, ProxyConfig, Resolution, Socks4aClient};
use torlib_rtcompat::{test_with_runtime, TcpListener, TcpProvider};
use torlib_rtmock::io::LocalStream;
use torlib_rtmock::net::{MockNetListener, MockNetProvider, MockNetwork};
use torlib_socksproto::SocksStatus;

/// What the fake proxy saw on the wire.
#[derive(Debug, PartialEq, Eq)]
struct SeenRequest {
    cmd: u8,
    port: u16,
    host: String,
}

/// Build a client, and a listener for a fake proxy at `localhost:9050`.
fn setup() -> (Socks4aClient<MockNetProvider>, MockNetListener) {
    let net = MockNetwork::new();
    let client_net = net
        .builder()
        .add_address("198.51.100.7".parse().unwrap())
        .provider();
    let proxy_net = net
        .builder()
        .add_address("127.0.0.1".parse().unwrap())
        .provider();
    let lis = proxy_net.listen_named("localhost", 9050).unwrap();
    (Socks4aClient::new(client_net, ProxyConfig::default()), lis)
}

/// Build a client for a proxy that nobody is listening for.
fn setup_unreachable() -> Socks4aClient<MockNetProvider> {
    let net = MockNetwork::new();
    let client_net = net
        .builder()
        .add_address("198.51.100.7".parse().unwrap())
        .provider();
    Socks4aClient::new(client_net, ProxyConfig::default())
}

async fn read_nul_terminated(s: &mut LocalStream) -> Vec<u8> {
    let mut out = Vec::new();
    let mut b = [0_u8; 1];
    loop {
        s.read_exact(&mut b[..]).await.unwrap();
        if b[0] == 0 {
            return out;
        }
        out.push(b[0]);
    }
}

/// Read one SOCKS4a request, checking the parts that never change.
async fn read_request(s: &mut LocalStream) -> SeenRequest {
    let mut hdr = [0_u8; 8];
    s.read_exact(&mut hdr[..]).await.unwrap();
    assert_eq!(hdr[0], 4);
    assert_eq!(&hdr[4..8], &[0, 0, 0, 1]);
    let userid = read_nul_terminated(s).await;
    assert!(userid.is_empty());
    let host = String::from_utf8(read_nul_terminated(s).await).unwrap();
    SeenRequest {
        cmd: hdr[1],
        port: u16::from_be_bytes([hdr[2], hdr[3]]),
        host,
    }
}

/// Accept one connection, read its request, and answer with `reply`.
///
/// Returns what we saw, along with the proxy's side of the connection.
async fn serve_one(lis: &MockNetListener, reply: &[u8]) -> (SeenRequest, LocalStream) {
    let (mut s, _addr) = lis.accept().await.unwrap();
    let req = read_request(&mut s).await;
    s.write_all(reply).await.unwrap();
    s.flush().await.unwrap();
    (req, s)
}

/// Return true if the other side of `s` has closed.
async fn is_closed(s: &mut LocalStream) -> bool {
    let mut buf = [0_u8; 16];
    matches!(s.read(&mut buf[..]).await, Ok(0))
}

#[test]
fn connect_granted() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (stream, (req, mut proxy)) = futures::join!(
            client.connect("www.torproject.org", 443),
            serve_one(&lis, &hex!("00 5A 0000 00000000"))
        );
        let mut stream = stream.unwrap();
        assert_eq!(
            req,
            SeenRequest {
                cmd: 0x01,
                port: 443,
                host: "www.torproject.org".into()
            }
        );

        // Now the proxy just relays bytes.
        stream.write_all(b"GET / HTTP/1.0\r\n\r\n").await.unwrap();
        stream.flush().await.unwrap();
        let mut buf = [0_u8; 18];
        proxy.read_exact(&mut buf[..]).await.unwrap();
        assert_eq!(&buf[..], b"GET / HTTP/1.0\r\n\r\n");

        proxy.write_all(b"HTTP/1.0 200 OK\r\n").await.unwrap();
        proxy.flush().await.unwrap();
        let mut buf = [0_u8; 17];
        stream.read_exact(&mut buf[..]).await.unwrap();
        assert_eq!(&buf[..], b"HTTP/1.0 200 OK\r\n");
    });
}

#[test]
fn connect_keeps_early_data() {
    // Bytes that arrive in the same chunk as the reply belong to the
    // application.
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (stream, _proxy) = futures::join!(
            client.connect("example.com", 80),
            serve_one(&lis, &hex!("00 5A 0050 7F000001 68 69"))
        );
        let mut stream = stream.unwrap();
        let mut buf = [0_u8; 2];
        stream.read_exact(&mut buf[..]).await.unwrap();
        assert_eq!(&buf, b"hi");
    });
}

#[test]
fn connect_rejected() {
    let cases: &[(u8, &str)] = &[
        (91, "91 Request rejected/failed - unknown reason."),
        (
            92,
            "92 Request rejected: SOCKS server cannot connect to identd on the client.",
        ),
        (
            93,
            "93 Request rejected: the client program and identd report different user-ids.",
        ),
        (5, "5 Unknown SOCKS status code."),
    ];

    for &(code, expected) in cases {
        test_with_runtime(|_rt| async move {
            let (client, lis) = setup();
            let reply = [0, code, 0, 0, 0, 0, 0, 0];
            let (res, (_req, mut proxy)) =
                futures::join!(client.connect("example.com", 80), serve_one(&lis, &reply));
            match res {
                Err(Error::Rejected {
                    status,
                    description,
                }) => {
                    assert_eq!(status, SocksStatus::from(code));
                    assert_eq!(description, expected);
                }
                Err(e) => panic!("wrong error {:?}", e),
                Ok(_) => panic!("connect succeeded with status {}", code),
            }
            // The client hung up on us.
            assert!(is_closed(&mut proxy).await);
        });
    }
}

#[test]
fn connect_rejected_display() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (res, _) = futures::join!(
            client.connect("example.com", 80),
            serve_one(&lis, &hex!("00 5B 0000 00000000"))
        );
        let e = res.err().unwrap();
        assert_eq!(
            e.to_string(),
            "91 Request rejected/failed - unknown reason."
        );
    });
}

#[test]
fn connect_bad_hostname() {
    test_with_runtime(|_rt| async {
        // Nobody is listening: if we tried to reach the proxy, we'd get
        // a connection-refused error instead.
        let client = setup_unreachable();
        let res = client.connect("evil\0.example.com", 80).await;
        assert!(matches!(
            res,
            Err(Error::Protocol(torlib_socksproto::Error::BadHostname(_)))
        ));
    });
}

#[test]
fn connect_unreachable() {
    test_with_runtime(|_rt| async {
        let client = setup_unreachable();
        let res = client.connect("example.com", 80).await;
        match res {
            Err(Error::Transport(e)) => assert_eq!(e.kind(), ErrorKind::ConnectionRefused),
            Err(e) => panic!("wrong error {:?}", e),
            Ok(_) => panic!("connected to nobody"),
        }
    });
}

#[test]
fn connect_truncated_reply() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (res, ()) = futures::join!(client.connect("example.com", 80), async {
            let (req, proxy) = serve_one(&lis, &hex!("00 5A 00")).await;
            assert_eq!(req.host, "example.com");
            drop(proxy);
        });
        assert!(matches!(
            res,
            Err(Error::Protocol(torlib_socksproto::Error::Truncated))
        ));
    });
}

#[test]
fn connect_odd_version() {
    // Proxies get the reply version wrong; that's not fatal.
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (res, _) = futures::join!(
            client.connect("example.com", 80),
            serve_one(&lis, &hex!("04 5A 0000 00000000"))
        );
        assert!(res.is_ok());
    });
}

#[test]
fn resolve_granted() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (res, (req, _proxy)) = futures::join!(
            client.resolve("example.com"),
            serve_one(&lis, &hex!("00 5A 0000 5DB8D822"))
        );
        assert_eq!(
            req,
            SeenRequest {
                cmd: 0xF0,
                port: 0,
                host: "example.com".into()
            }
        );
        assert_eq!(res, Resolution::Resolved(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(res.to_string(), "93.184.216.34");
    });
}

#[test]
fn resolve_releases_connection() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (res, (_req, mut proxy)) = futures::join!(
            client.resolve("example.com"),
            serve_one(&lis, &hex!("00 5A 0000 0A000001"))
        );
        assert_eq!(res.addr(), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(is_closed(&mut proxy).await);
    });
}

#[test]
fn resolve_rejected() {
    for &code in &[91_u8, 92, 93, 0, 255] {
        test_with_runtime(|_rt| async move {
            let (client, lis) = setup();
            let reply = [0, code, 0, 0, 93, 184, 216, 34];
            let (res, _) = futures::join!(client.resolve("example.com"), serve_one(&lis, &reply));
            assert_eq!(res, Resolution::Unresolved);
        });
    }
}

#[test]
fn resolve_dropped() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (res, ()) = futures::join!(client.resolve("example.com"), async {
            let (_req, proxy) = serve_one(&lis, &hex!("00 5A 00")).await;
            drop(proxy);
        });
        assert_eq!(res, Resolution::Unresolved);
    });
}

#[test]
fn resolve_failures_are_quiet() {
    test_with_runtime(|_rt| async {
        let client = setup_unreachable();
        assert_eq!(client.resolve("example.com").await, Resolution::Unresolved);
        assert_eq!(client.resolve("bad\0name").await, Resolution::Unresolved);
    });
}

#[test]
fn try_resolve_reports() {
    test_with_runtime(|_rt| async {
        let client = setup_unreachable();
        let e = client.try_resolve("example.com").await;
        assert!(matches!(e, Err(Error::Transport(_))));

        let (client, lis) = setup();
        let (res, _) = futures::join!(
            client.try_resolve("example.com"),
            serve_one(&lis, &hex!("00 5B 0000 00000000"))
        );
        match res {
            Err(Error::Rejected { status, .. }) => assert_eq!(status, SocksStatus::RejectedGeneric),
            other => panic!("unexpected {:?}", other),
        }

        let (res, ()) = futures::join!(client.try_resolve("example.com"), async {
            let (_req, proxy) = serve_one(&lis, &hex!("00")).await;
            drop(proxy);
        });
        assert!(matches!(
            res,
            Err(Error::Protocol(torlib_socksproto::Error::Truncated))
        ));
    });
}

#[test]
fn concurrent_requests() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (a, b, r, mut seen) = futures::join!(
            client.connect("a.example", 1111),
            client.connect("b.example", 2222),
            client.resolve("c.example"),
            async {
                let mut seen = Vec::new();
                let mut streams = Vec::new();
                for _ in 0..3_usize {
                    let (req, s) = serve_one(&lis, &hex!("00 5A 0000 C0000201")).await;
                    seen.push(req);
                    streams.push(s);
                }
                seen
            }
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(r.addr(), Some(Ipv4Addr::new(192, 0, 2, 1)));

        seen.sort_by(|x, y| x.host.cmp(&y.host));
        assert_eq!(
            seen,
            vec![
                SeenRequest {
                    cmd: 0x01,
                    port: 1111,
                    host: "a.example".into()
                },
                SeenRequest {
                    cmd: 0x01,
                    port: 2222,
                    host: "b.example".into()
                },
                SeenRequest {
                    cmd: 0xF0,
                    port: 0,
                    host: "c.example".into()
                },
            ]
        );
    });
}

#[test]
fn cancel_releases_connection() {
    test_with_runtime(|_rt| async {
        let (client, lis) = setup();
        let (mut proxy, seen) = {
            let connecting = client.connect("example.com", 80).fuse();
            let accepting = lis.accept().fuse();
            futures::pin_mut!(connecting, accepting);
            // Run the client far enough to send its request, then give up
            // on it without ever replying.
            let (mut s, _addr) = futures::select! {
                _ = connecting => panic!("connect finished without a reply"),
                acc = accepting => acc.unwrap(),
            };
            let seen = read_request(&mut s).await;
            (s, seen)
        };
        assert_eq!(seen.host, "example.com");
        assert!(is_closed(&mut proxy).await);
    });
}

// Talk to a fake proxy on a real loopback socket.
//
// NOTE: requires Ipv4 localhost.
#[test]
fn real_loopback() {
    test_with_runtime(|rt| async move {
        let lis = rt
            .listen(&"127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let port = lis.local_addr().unwrap().port();
        let client = Socks4aClient::new(rt.clone(), ProxyConfig::new("127.0.0.1", port));

        let (res, ()) = futures::join!(client.resolve("www.torproject.org"), async {
            let (mut s, _addr) = lis.accept().await.unwrap();
            let mut buf = vec![0_u8; 10 + "www.torproject.org".len()];
            s.read_exact(&mut buf[..]).await.unwrap();
            assert_eq!(&buf[..8], &hex!("04 F0 0000 00000001"));
            s.write_all(&hex!("00 5A 0000 5DB8D822")).await.unwrap();
            s.flush().await.unwrap();
        });
        assert_eq!(res.to_string(), "93.184.216.34");
    });
}
