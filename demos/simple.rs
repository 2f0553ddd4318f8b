use lamport_ots::stream::{Input, Output};
use lamport_ots::{HashAlgorithm, Lamport, Operation, Outcome, Params, SecretKey, Verdict};
use std::fs;

fn simple_lamport() {
    // Every key and signature is tied to one hash function. Its digest size h
    // fixes all other sizes: keys are 16h blocks of h bytes, signatures 8h.
    let params = Params::new(HashAlgorithm::Sha256).unwrap();
    let lamport = Lamport::new(params);

    // Create a key pair. The public key may be shared freely.
    let secret = lamport.keygen().unwrap();
    let public = lamport.public_key(&secret).unwrap();
    println!(
        "secret key: {} bytes, public key: {} bytes",
        secret.as_bytes().len(),
        public.as_bytes().len()
    );

    // Signing consumes the secret key, since it must never sign twice.
    let msg1 = "Hi! This is my one and only message.".as_bytes();
    let sig1 = lamport.sign(secret, msg1).unwrap();
    println!("signature: {} bytes", sig1.as_bytes().len());

    // Anyone holding the public key can verify.
    assert_eq!(lamport.verify(&public, &sig1, msg1).unwrap(), Verdict::Valid);

    // A different message does not verify under the same signature.
    let msg2 = "Hi! This is a message I never signed.".as_bytes();
    assert_eq!(lamport.verify(&public, &sig1, msg2).unwrap(), Verdict::Invalid);

    // The same flow through files, as the command-line tool runs it.
    let dir = std::env::temp_dir().join(format!("lamport-ots-simple-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("message"), msg1).unwrap();

    let operations = [
        Operation::GenKey {
            output: Output::File(dir.join("key.sec")),
        },
        Operation::PubKey {
            secret: Input::File(dir.join("key.sec")),
            public: Output::File(dir.join("key.pub")),
        },
        Operation::Sign {
            message: Input::File(dir.join("message")),
            secret: Input::File(dir.join("key.sec")),
            signature: Output::File(dir.join("message.sig")),
        },
        Operation::Verify {
            message: Input::File(dir.join("message")),
            public: Input::File(dir.join("key.pub")),
            signature: Input::File(dir.join("message.sig")),
        },
    ];
    for operation in &operations {
        let outcome = operation.run(&params).unwrap();
        println!("{}: {:?}", operation.name(), outcome);
        assert_ne!(outcome, Outcome::Verified(Verdict::Invalid));
    }

    // A key loaded from disk works with the in-memory API as well.
    let stored = SecretKey::from_bytes(params, &fs::read(dir.join("key.sec")).unwrap()).unwrap();
    let stored_public = stored.public_key().unwrap();
    assert_eq!(stored_public.as_bytes(), fs::read(dir.join("key.pub")).unwrap());

    fs::remove_dir_all(&dir).unwrap();
}

fn main() {
    simple_lamport();
}
