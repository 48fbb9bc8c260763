use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Asked when the TLD is not in the table; answers with a `refer:` line.
pub const IANA_WHOIS: &str = "whois.iana.org";

static WHOIS_SERVERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Generic TLDs
    m.insert("com", "whois.verisign-grs.com");
    m.insert("net", "whois.verisign-grs.com");
    m.insert("org", "whois.pir.org");
    m.insert("info", "whois.afilias.net");
    m.insert("biz", "whois.biz");
    m.insert("name", "whois.nic.name");
    m.insert("mobi", "whois.afilias.net");
    m.insert("pro", "whois.registrypro.pro");

    // New gTLDs
    m.insert("app", "whois.nic.google");
    m.insert("dev", "whois.nic.google");
    m.insert("page", "whois.nic.google");
    m.insert("io", "whois.nic.io");
    m.insert("co", "whois.nic.co");
    m.insert("me", "whois.nic.me");
    m.insert("tv", "whois.nic.tv");
    m.insert("cc", "ccwhois.verisign-grs.com");
    m.insert("xyz", "whois.nic.xyz");
    m.insert("online", "whois.nic.online");
    m.insert("site", "whois.nic.site");
    m.insert("tech", "whois.nic.tech");
    m.insert("store", "whois.nic.store");
    m.insert("shop", "whois.nic.shop");
    m.insert("ai", "whois.nic.ai");
    m.insert("gg", "whois.gg");
    m.insert("bet", "whois.nic.bet");
    m.insert("casino", "whois.nic.casino");
    m.insert("games", "whois.nic.games");
    m.insert("win", "whois.nic.win");
    m.insert("vip", "whois.nic.vip");
    m.insert("club", "whois.nic.club");
    m.insert("top", "whois.nic.top");
    m.insert("fun", "whois.nic.fun");

    // Country codes
    m.insert("uk", "whois.nic.uk");
    m.insert("de", "whois.denic.de");
    m.insert("fr", "whois.nic.fr");
    m.insert("nl", "whois.domain-registry.nl");
    m.insert("eu", "whois.eu");
    m.insert("ru", "whois.tcinet.ru");
    m.insert("ua", "whois.ua");
    m.insert("pl", "whois.dns.pl");
    m.insert("it", "whois.nic.it");
    m.insert("es", "whois.nic.es");
    m.insert("ca", "whois.cira.ca");
    m.insert("au", "whois.auda.org.au");
    m.insert("br", "whois.registro.br");
    m.insert("in", "whois.registry.in");
    m.insert("jp", "whois.jprs.jp");
    m.insert("us", "whois.nic.us");

    m
});

pub fn get_whois_server(tld: &str) -> Option<&'static str> {
    WHOIS_SERVERS.get(tld.to_ascii_lowercase().as_str()).copied()
}

pub fn get_tld(domain: &str) -> Option<&str> {
    let domain = domain.trim_end_matches('.');
    let (_, tld) = domain.rsplit_once('.')?;
    (!tld.is_empty()).then_some(tld)
}
