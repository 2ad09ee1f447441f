use pdf_signature_stamp::{LocalCertificateFile, SigningConfig, SigningSession};
use std::{fs::File, io::Write};

// Usage: sign_doc <input.pdf> <certificate.p12|.pem> [password] [config.json]
#[tokio::main]
async fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let (pdf_file_name, cert_file_name) = match (args.next(), args.next()) {
        (Some(pdf), Some(cert)) => (pdf, cert),
        _ => {
            eprintln!("Usage: sign_doc <input.pdf> <certificate> [password] [config.json]");
            std::process::exit(2);
        }
    };
    let password = args.next();
    let config = match args.next() {
        Some(path) => SigningConfig::load(path).unwrap(),
        None => SigningConfig::default(),
    };

    let pdf_data = std::fs::read(&pdf_file_name).unwrap();
    let cert_data = std::fs::read(&cert_file_name).unwrap();
    let cert_file = LocalCertificateFile::new(cert_file_name.clone(), cert_data).unwrap();

    let session = SigningSession::new(config);
    session.load_document(pdf_data);

    let preview = session
        .preview_local_file(&cert_file, password.as_deref())
        .await
        .unwrap();
    println!("{}", preview);

    let signed = session
        .sign_with_local_file(cert_file, password)
        .await
        .unwrap();
    let pdf_file_data = session.current_document().unwrap();

    let mut pdf_file = File::create(&signed.suggested_file_name).unwrap();
    pdf_file.write_all(&pdf_file_data).unwrap();
    println!(
        "Signed by {} as `{}`, written to {}",
        signed.signer_name, signed.reference, signed.suggested_file_name
    );
}
